//! Level script interpreter
//!
//! Runs a [`Script`] against a fresh level. Ops execute in declaration
//! order and an op's children execute as soon as the op has resolved its
//! position, so every draw lands in the same place it would when the
//! script is read top to bottom. Afterwards the level is wallified and any
//! stairs or branch connection the topology needs but the script did not
//! place are put on random free floor, failing when none is left.

use hashbrown::HashMap;
use log::debug;

use crate::error::{CallPath, Connection, GenError, Result, ScriptErrorKind};
use crate::{COLNO, ROWNO};

use super::corridor::make_corridors;
use super::des::{HAlign, InitStyle, Loc, MapAlign, MapSpec, Op, RoomSpec, Script, SelExpr, VAlign};
use super::generation::{draw_position, generate_level, room_fits, GenContext};
use super::special_rooms::{fill_special_room, set_level_flags_for_room};
use super::stairs::place_link;
use super::wallify::wallify;
use super::{
    Alignment, Cell, CellType, DLevel, DoorState, Level, MonsterPlacement, ObjectPlacement, Rect,
    Room, RoomKind, Selection, StairPlan, TrapKind,
};

type Step<T> = core::result::Result<T, ScriptErrorKind>;

/// Coordinate frame and container an op runs in
#[derive(Debug, Clone, Copy)]
struct Frame {
    area: Rect,
    container: Option<usize>,
}

/// Which cells a random location may pick
#[derive(Debug, Clone, Copy)]
enum Want {
    /// Anything a monster or object can stand on
    Open,
    /// Plain unoccupied floor
    Free,
    /// Wall or existing door
    Wall,
}

impl Want {
    fn accepts(self, level: &Level, x: usize, y: usize) -> bool {
        let typ = level.cells[x][y].typ;
        match self {
            Want::Open => typ.is_passable(),
            Want::Free => level.is_free_floor(x, y),
            Want::Wall => typ.is_wall() || typ.is_door(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Origin<'s> {
    script: &'s str,
    dlevel: DLevel,
}

impl Origin<'_> {
    fn error(&self, call: &CallPath, kind: ScriptErrorKind) -> GenError {
        GenError::Script {
            script: self.script.to_string(),
            dlevel: self.dlevel,
            call: call.clone(),
            kind,
        }
    }
}

struct Interpreter<'e, 'a> {
    origin: Origin<'e>,
    level: &'e mut Level,
    ctx: &'e mut GenContext<'a>,
    plan: &'e StairPlan,
    vars: HashMap<String, Selection>,
    map_area: Option<Rect>,
}

/// Build a level from a script
pub fn run_script(
    script: &Script,
    level: &mut Level,
    ctx: &mut GenContext<'_>,
    plan: &StairPlan,
) -> Result<()> {
    debug!("{}: running script '{}'", level.dlevel, script.id);
    let origin = Origin {
        script: &script.id,
        dlevel: level.dlevel,
    };
    let mut interp = Interpreter {
        origin,
        level,
        ctx,
        plan,
        vars: HashMap::new(),
        map_area: None,
    };
    let frame = Frame {
        area: Rect::full_map(),
        container: None,
    };
    let root = CallPath::default();
    interp.run(&script.ops, frame, &root)?;
    interp.finish(&root.child(script.ops.len()))
}

impl Interpreter<'_, '_> {
    fn run(&mut self, ops: &[Op], mut frame: Frame, parent: &CallPath) -> Result<()> {
        for (i, op) in ops.iter().enumerate() {
            let path = parent.child(i);
            self.exec(op, frame, &path)?;
            if let (Op::Map(_), Some(area)) = (op, self.map_area) {
                frame.area = area;
            }
        }
        Ok(())
    }

    fn depth(&self) -> i8 {
        self.level.dlevel.depth
    }

    fn exec(&mut self, op: &Op, frame: Frame, path: &CallPath) -> Result<()> {
        let origin = self.origin;
        let fail = |kind: ScriptErrorKind| origin.error(path, kind);

        match op {
            Op::Init(InitStyle::Solid(typ)) => self.level.fill(*typ),
            Op::Init(InitStyle::Generic) => generate_level(self.level, self.ctx, self.plan)?,
            Op::Flags(flags) => {
                for flag in flags {
                    self.level.flags.set(*flag);
                }
            }
            Op::Map(map) => {
                let area = self.blit(map).map_err(fail)?;
                self.map_area = Some(area);
            }
            Op::Terrain { sel, typ } => {
                let sel = self.eval(sel, frame).map_err(fail)?;
                sel.for_each(|x, y| {
                    self.level.cells[x][y] = Cell {
                        typ: *typ,
                        lit: self.level.cells[x][y].lit,
                        room_number: self.level.cells[x][y].room_number,
                        ..Cell::stone()
                    };
                });
            }
            Op::Select { name, sel } => {
                let sel = self.eval(sel, frame).map_err(fail)?;
                self.vars.insert(name.clone(), sel);
            }
            Op::NonDiggable(sel) => {
                let sel = self.eval(sel, frame).map_err(fail)?;
                sel.for_each(|x, y| self.level.cells[x][y].non_diggable = true);
            }
            Op::NonPassable(sel) => {
                let sel = self.eval(sel, frame).map_err(fail)?;
                sel.for_each(|x, y| self.level.cells[x][y].non_passable = true);
            }
            Op::Region {
                area,
                lit,
                kind,
                contents,
            } => {
                let sel = self.eval(area, frame).map_err(fail)?;
                let bounds = sel.bounds().ok_or_else(|| fail(ScriptErrorKind::EmptySelection))?;
                if let Some(lit) = lit {
                    sel.for_each(|x, y| self.level.cells[x][y].lit = *lit);
                }
                if let Some(kind) = kind {
                    self.register_region(bounds, *lit, *kind).map_err(fail)?;
                }
                let inner = Frame {
                    area: bounds,
                    container: frame.container,
                };
                self.run(contents, inner, path)?;
            }
            Op::Room { spec, contents } => {
                let room = self.carve_room(spec, frame).map_err(fail)?;
                let inner = Frame {
                    area: self.level.rooms[room].interior(),
                    container: None,
                };
                self.run(contents, inner, path)?;
            }
            Op::Corridors => {
                make_corridors(self.level, self.ctx);
            }
            Op::Monster { loc, spec } => {
                if frame.container.is_some() {
                    return Err(fail(ScriptErrorKind::MonsterInContainer));
                }
                let (x, y) = self.locate(loc, frame, Want::Open).map_err(fail)?;
                let depth = self.depth();
                let ident = match &spec.ident {
                    Some(ident) => ident.clone(),
                    None => self.ctx.tables.random_monster(self.ctx.rng, depth, spec.class),
                };
                self.level.add_monster(MonsterPlacement {
                    asleep: spec.asleep,
                    peaceful: spec.peaceful,
                    disguise: spec.appear_as.clone(),
                    ..MonsterPlacement::new(x, y, ident)
                });
            }
            Op::Object {
                loc,
                spec,
                contents,
            } => {
                let (x, y) = match frame.container {
                    Some(outer) => (self.level.objects[outer].x, self.level.objects[outer].y),
                    None => self.locate(loc, frame, Want::Open).map_err(fail)?,
                };
                let ident = match &spec.ident {
                    Some(ident) => ident.clone(),
                    None => self.ctx.tables.random_object(self.ctx.rng, spec.class),
                };
                let index = self.level.add_object(ObjectPlacement {
                    quantity: spec.quantity,
                    trapped: spec.trapped,
                    locked: spec.locked,
                    buried: spec.buried,
                    container: frame.container,
                    ..ObjectPlacement::new(x, y, ident)
                });
                let inner = Frame {
                    area: frame.area,
                    container: Some(index),
                };
                self.run(contents, inner, path)?;
            }
            Op::Trap { loc, kind } => {
                let (x, y) = self.locate(loc, frame, Want::Free).map_err(fail)?;
                let kind = match kind {
                    Some(kind) => *kind,
                    None => TrapKind::random(self.ctx.rng, self.depth()),
                };
                self.level.add_trap(x, y, kind);
            }
            Op::Door { loc, state, secret } => {
                let (x, y) = self.locate(loc, frame, Want::Wall).map_err(fail)?;
                let state = match state {
                    Some(state) => *state,
                    None => self.ctx.options.doors.pick(self.ctx.rng),
                };
                self.level.set_door(x, y, state, *secret);
            }
            Op::Altar { loc, align } => {
                let (x, y) = self.locate(loc, frame, Want::Free).map_err(fail)?;
                let align = match align {
                    Some(align) => *align,
                    None => Alignment::random(self.ctx.rng),
                };
                self.level.cells[x][y].make_altar(align);
            }
            Op::Fountain(loc) => {
                let (x, y) = self.locate(loc, frame, Want::Free).map_err(fail)?;
                self.level.cells[x][y].typ = CellType::Fountain;
            }
            Op::Stair { loc, up } => {
                let destination = if *up { self.plan.up } else { self.plan.down };
                match destination {
                    Some(destination) => {
                        let (x, y) = self.locate(loc, frame, Want::Free).map_err(fail)?;
                        self.level.add_stairs(x, y, *up, destination, false);
                    }
                    None => debug!(
                        "{}: no {} stair on this level, skipping call {path}",
                        self.level.dlevel,
                        if *up { "up" } else { "down" }
                    ),
                }
            }
            Op::Portal(loc) => match self.plan.branch {
                Some(link) => {
                    let (x, y) = self.locate(loc, frame, Want::Free).map_err(fail)?;
                    place_link(self.level, x, y, &link);
                }
                None => debug!(
                    "{}: no branch connection here, skipping call {path}",
                    self.level.dlevel
                ),
            },
            Op::ForEach { sel, contents } => {
                let points: Vec<(usize, usize)> =
                    self.eval(sel, frame).map_err(fail)?.iter().collect();
                for (x, y) in points {
                    let inner = Frame {
                        area: Rect::new(x, y, x, y),
                        container: frame.container,
                    };
                    self.run(contents, inner, path)?;
                }
            }
            Op::Wallify => wallify(self.level),
        }
        Ok(())
    }

    /// Copy an ASCII map onto the level; returns the area it covers
    fn blit(&mut self, map: &MapSpec) -> Step<Rect> {
        let (width, height) = (map.width(), map.height());
        let (x0, y0) = match map.align {
            MapAlign::At(x, y) => (x, y),
            MapAlign::Edge(h, v) => {
                let x = match h {
                    HAlign::Left => 1,
                    HAlign::Center => 1 + (COLNO as i32 - 1 - width as i32) / 2,
                    HAlign::Right => COLNO as i32 - width as i32,
                };
                let y = match v {
                    VAlign::Top => 0,
                    VAlign::Center => (ROWNO as i32 - height as i32) / 2,
                    VAlign::Bottom => ROWNO as i32 - height as i32,
                };
                (x, y)
            }
        };
        if width == 0
            || height == 0
            || x0 < 0
            || y0 < 0
            || x0 as usize + width > COLNO
            || y0 as usize + height > ROWNO
        {
            return Err(ScriptErrorKind::MapDoesNotFit {
                width,
                height,
                x: x0,
                y: y0,
            });
        }
        let (x0, y0) = (x0 as usize, y0 as usize);

        for (dy, row) in map.rows.iter().enumerate() {
            let mut glyphs = row.chars();
            for dx in 0..width {
                let c = glyphs.next().unwrap_or(' ');
                let typ = match CellType::from_map_char(c) {
                    Some(Some(typ)) => typ,
                    Some(None) => continue,
                    None => return Err(ScriptErrorKind::UnknownGlyph(c)),
                };
                let cell = &mut self.level.cells[x0 + dx][y0 + dy];
                *cell = Cell {
                    typ,
                    ..Cell::stone()
                };
                if typ == CellType::Door {
                    cell.set_door_state(DoorState::CLOSED);
                }
            }
        }
        Ok(Rect::new(x0, y0, x0 + width - 1, y0 + height - 1))
    }

    /// Turn a region into a typed room over the existing terrain
    fn register_region(&mut self, bounds: Rect, lit: Option<bool>, kind: RoomKind) -> Step<()> {
        if bounds.lx == 0 || bounds.ly == 0 || bounds.hx >= COLNO - 1 || bounds.hy >= ROWNO - 1 {
            return Err(ScriptErrorKind::OutOfBounds {
                x: bounds.lx as i32,
                y: bounds.ly as i32,
            });
        }
        let mut room = Room::new(bounds.lx, bounds.ly, bounds.hx, bounds.hy);
        room.lit = lit.unwrap_or(self.level.cells[bounds.lx][bounds.ly].lit);
        room.set_kind(kind);
        self.level.register_room(room);
        set_level_flags_for_room(&mut self.level.flags, kind);
        Ok(())
    }

    fn draw_size(&mut self) -> (usize, usize) {
        let opts = self.ctx.options.builder;
        let w = 3 + self.ctx.rng.rn2(opts.width_range) as usize;
        let h = 2 + self.ctx.rng.rn2(opts.height_range) as usize;
        (w, h)
    }

    /// Carve a scripted room. A fixed position is taken as given; otherwise
    /// generic room attempts are made until one fits.
    fn carve_room(&mut self, spec: &RoomSpec, frame: Frame) -> Step<usize> {
        let (lx, ly, w, h) = match spec.pos {
            Some((dx, dy)) => {
                let (w, h) = match spec.size {
                    Some(size) => size,
                    None => self.draw_size(),
                };
                let lx = frame.area.lx as i32 + dx;
                let ly = frame.area.ly as i32 + dy;
                let fits = lx >= 1
                    && ly >= 1
                    && w > 0
                    && h > 0
                    && lx as usize + w < COLNO
                    && ly as usize + h < ROWNO;
                if !fits {
                    return Err(ScriptErrorKind::OutOfBounds { x: lx, y: ly });
                }
                (lx as usize, ly as usize, w, h)
            }
            None => self.random_room_spot(spec)?,
        };

        let mut room = Room::new(lx, ly, lx + w - 1, ly + h - 1);
        room.lit = spec.lit;
        room.set_kind(spec.kind);
        let index = self.level.add_room(room);
        set_level_flags_for_room(&mut self.level.flags, spec.kind);
        Ok(index)
    }

    fn random_room_spot(&mut self, spec: &RoomSpec) -> Step<(usize, usize, usize, usize)> {
        let opts = self.ctx.options.builder;
        for _ in 0..opts.room_attempts {
            let (lx, ly) = draw_position(self.ctx.rng);
            let (w, h) = match spec.size {
                Some(size) => size,
                None => self.draw_size(),
            };
            if w == 0 || h == 0 {
                return Err(ScriptErrorKind::RoomDoesNotFit);
            }
            if room_fits(&self.level.rooms, lx, ly, lx + w - 1, ly + h - 1, opts.room_gap) {
                return Ok((lx, ly, w, h));
            }
        }
        Err(ScriptErrorKind::RoomDoesNotFit)
    }

    fn locate(&mut self, loc: &Loc, frame: Frame, want: Want) -> Step<(usize, usize)> {
        let candidates = match loc {
            Loc::At(dx, dy) => {
                let x = frame.area.lx as i32 + dx;
                let y = frame.area.ly as i32 + dy;
                if !Level::is_valid_pos(x, y) {
                    return Err(ScriptErrorKind::OutOfBounds { x, y });
                }
                return Ok((x as usize, y as usize));
            }
            Loc::Random => {
                let level = &*self.level;
                Selection::from_rect(&frame.area).filter(|x, y| want.accepts(level, x, y))
            }
            Loc::In(expr) => self.eval(expr, frame)?,
        };
        candidates
            .random_coordinate(self.ctx.rng)
            .ok_or(ScriptErrorKind::EmptySelection)
    }

    fn eval(&self, expr: &SelExpr, frame: Frame) -> Step<Selection> {
        let (ox, oy) = (frame.area.lx as i32, frame.area.ly as i32);
        let sel = match expr {
            SelExpr::Rect(x1, y1, x2, y2) => Selection::rect(ox + x1, oy + y1, ox + x2, oy + y2)?,
            SelExpr::Outline(x1, y1, x2, y2) => {
                Selection::outline(ox + x1, oy + y1, ox + x2, oy + y2)?
            }
            SelExpr::Line(x1, y1, x2, y2) => Selection::line(ox + x1, oy + y1, ox + x2, oy + y2)?,
            SelExpr::Match(typ) => Selection::matching(&*self.level, |t| t == *typ)
                .intersect(&Selection::from_rect(&frame.area)),
            SelExpr::Flood(x, y) => {
                let typ = self.level.typ_at(ox + x, oy + y);
                Selection::flood(&*self.level, ox + x, oy + y, |t| t == typ)?
            }
            SelExpr::Var(name) => self
                .vars
                .get(name)
                .cloned()
                .ok_or_else(|| ScriptErrorKind::UndefinedVariable(name.clone()))?,
            SelExpr::Union(a, b) => self.eval(a, frame)?.union(&self.eval(b, frame)?),
            SelExpr::Intersect(a, b) => self.eval(a, frame)?.intersect(&self.eval(b, frame)?),
            SelExpr::Difference(a, b) => self.eval(a, frame)?.difference(&self.eval(b, frame)?),
            SelExpr::Negate(a) => self.eval(a, frame)?.negate(),
            SelExpr::Grow(a) => self.eval(a, frame)?.grow(),
            SelExpr::Bounds(a) => match self.eval(a, frame)?.bounds() {
                Some(rect) => Selection::from_rect(&rect),
                None => Selection::new(),
            },
            SelExpr::MapArea => Selection::from_rect(&self.map_area.unwrap_or(Rect::full_map())),
        };
        Ok(sel)
    }

    /// Random free floor anywhere on the level, one draw
    fn free_spot(&mut self, connection: Connection, call: &CallPath) -> Result<(usize, usize)> {
        let level = &*self.level;
        Selection::matching(level, |t| t == CellType::Room)
            .filter(|x, y| level.is_free_floor(x, y))
            .random_coordinate(self.ctx.rng)
            .ok_or_else(|| {
                self.origin
                    .error(call, ScriptErrorKind::NoStairPosition(connection))
            })
    }

    /// Wallify, then add the connections the script left out. Errors
    /// raised here carry the call path one past the last top-level op.
    fn finish(mut self, call: &CallPath) -> Result<()> {
        wallify(self.level);

        let plan = *self.plan;
        let has = |level: &Level, up: bool| level.stairs.iter().any(|s| s.up == up && !s.branch);
        if let Some(destination) = plan.down {
            if !has(&*self.level, false) {
                let (x, y) = self.free_spot(Connection::DownStairs, call)?;
                self.level.add_stairs(x, y, false, destination, false);
            }
        }
        if let Some(destination) = plan.up {
            if !has(&*self.level, true) {
                let (x, y) = self.free_spot(Connection::UpStairs, call)?;
                self.level.add_stairs(x, y, true, destination, false);
            }
        }
        if let Some(link) = plan.branch {
            let linked =
                self.level.stairs.iter().any(|s| s.branch) || !self.level.portals.is_empty();
            if !linked {
                let (x, y) = self.free_spot(Connection::BranchLink, call)?;
                place_link(self.level, x, y, &link);
            }
        }

        for room in 0..self.level.rooms.len() {
            if self.level.rooms[room].needs_fill {
                fill_special_room(self.level, self.ctx, room);
            }
        }

        if self.level.floor_count() == 0 {
            return Err(GenError::NoFloor(self.level.dlevel));
        }
        Ok(())
    }
}
