//! Generation session
//!
//! A session owns the one random generator every level draws from, the
//! topology resolved from it at start-up, and the script registry with its
//! variant choices. Levels must be generated one at a time through
//! [`Session::generate_level`].

use log::info;

use crate::dungeon::builtin_levels::register_builtin;
use crate::dungeon::{
    generate_level, run_script, BranchId, DLevel, GenContext, Level, Registry, Topology, Variant,
};
use crate::error::Result;
use crate::options::GenOptions;
use crate::rng::GameRng;
use crate::save::SessionSnapshot;
use crate::tables::{ContentTables, UniformTables};

pub struct Session {
    rng: GameRng,
    options: GenOptions,
    topology: Topology,
    registry: Registry,
    tables: Box<dyn ContentTables>,
}

impl Session {
    /// Seed the generator and resolve the dungeon layout
    ///
    /// Topology resolution is the first thing drawn, so every level of a
    /// session sees the same attachment depths.
    pub fn new(seed: u64, options: GenOptions) -> Result<Self> {
        let mut rng = GameRng::new(seed);
        let topology = Topology::standard(&mut rng)?;
        info!(
            "session {seed}: main dungeon has {} levels",
            topology.num_levels(BranchId::Main).unwrap_or(0)
        );
        let mut registry = Registry::new();
        registry.clear_choices();
        Ok(Self {
            rng,
            options,
            topology,
            registry,
            tables: Box::new(UniformTables::default()),
        })
    }

    /// Register the built-in level scripts
    pub fn with_builtin_levels(mut self) -> Result<Self> {
        register_builtin(&mut self.registry)?;
        Ok(self)
    }

    /// Use other monster and object tables
    pub fn with_tables(mut self, tables: Box<dyn ContentTables>) -> Self {
        self.tables = tables;
        self
    }

    /// Register scripts for a dungeon coordinate
    pub fn register(&mut self, dlevel: DLevel, variants: Vec<Variant>) -> Result<()> {
        self.registry.register(dlevel, variants)
    }

    pub fn rng(&self) -> &GameRng {
        &self.rng
    }

    pub fn rng_mut(&mut self) -> &mut GameRng {
        &mut self.rng
    }

    pub fn options(&self) -> &GenOptions {
        &self.options
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Generate the level at a coordinate
    ///
    /// A registered script is run when there is one, otherwise the generic
    /// builder. Each coordinate should be generated once per session.
    pub fn generate_level(&mut self, branch: BranchId, depth: i8) -> Result<Level> {
        let dlevel = DLevel::new(branch, depth);
        self.topology.validate(dlevel)?;
        let plan = self.topology.stair_plan(dlevel);
        let start = self.rng.call_count();

        let mut level = Level::new(dlevel);
        let mut ctx = GenContext {
            rng: &mut self.rng,
            options: &self.options,
            tables: self.tables.as_ref(),
        };
        let script = self.registry.select(dlevel, ctx.rng);
        let source = match script {
            Some(script) => {
                run_script(script, &mut level, &mut ctx, &plan)?;
                script.id.as_str()
            }
            None => {
                generate_level(&mut level, &mut ctx, &plan)?;
                "generic builder"
            }
        };

        info!(
            "{dlevel}: {source}, {} rooms, {} monsters, {} objects, {} traps, {} draws",
            level.rooms.len(),
            level.monsters.len(),
            level.objects.len(),
            level.traps.len(),
            self.rng.call_count() - start
        );
        Ok(level)
    }

    /// Capture everything needed to continue this session later
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::new(&self.rng, &self.topology, self.registry.choices())
    }

    /// Continue from a snapshot; registered scripts are kept
    pub fn restore(&mut self, snapshot: &SessionSnapshot) {
        self.rng = snapshot.rng.clone();
        self.topology = snapshot.topology.clone();
        self.registry.restore_choices(&snapshot.choices);
    }

    /// Build a session directly from a snapshot
    pub fn from_snapshot(snapshot: &SessionSnapshot, options: GenOptions) -> Self {
        let mut registry = Registry::new();
        registry.restore_choices(&snapshot.choices);
        Self {
            rng: snapshot.rng.clone(),
            options,
            topology: snapshot.topology.clone(),
            registry,
            tables: Box::new(UniformTables::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topology_is_first_draw() {
        let session = Session::new(42, GenOptions::default()).unwrap();
        assert_eq!(session.rng().call_count(), 4);
    }

    #[test]
    fn test_unknown_depth_is_rejected() {
        let mut session = Session::new(1, GenOptions::default()).unwrap();
        assert!(session.generate_level(BranchId::Mines, 40).is_err());
        assert!(session.generate_level(BranchId::Main, 0).is_err());
        assert_eq!(session.rng().call_count(), 4);
    }

    #[test]
    fn test_builtin_script_is_used() {
        let mut session = Session::new(3, GenOptions::default())
            .unwrap()
            .with_builtin_levels()
            .unwrap();
        let level = session.generate_level(BranchId::Main, 5).unwrap();
        assert!(
            level
                .monsters
                .iter()
                .any(|m| m.ident == crate::tables::Ident::named("Oracle"))
        );
    }
}
