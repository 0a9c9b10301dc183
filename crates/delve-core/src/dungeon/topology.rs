//! Dungeon topology
//!
//! The dungeon is a handful of branches, each a run of levels numbered from
//! 1, hanging off one level of a parent branch. Sizes and attachment depths
//! are drawn once when a session starts and never change afterwards.

use log::debug;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::DLevel;
use crate::error::{GenError, Result};
use crate::rng::GameRng;

/// Dungeon branch identifiers
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BranchId {
    #[default]
    Main,
    Mines,
    Sokoban,
    Quest,
    Gehennom,
    Planes,
}

/// How a parent level connects to a child branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum LinkKind {
    StairsDown,
    StairsUp,
    Portal,
}

impl LinkKind {
    /// The same connection seen from the other end
    pub const fn reversed(&self) -> LinkKind {
        match self {
            LinkKind::StairsDown => LinkKind::StairsUp,
            LinkKind::StairsUp => LinkKind::StairsDown,
            LinkKind::Portal => LinkKind::Portal,
        }
    }
}

/// Where on the parent a branch attaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Attach {
    /// Some depth in `lo..=hi`
    Range { lo: i8, hi: i8 },
    /// The parent's last level
    Bottom,
}

/// Static description of a branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchDef {
    pub id: BranchId,
    /// Fixed number of levels
    pub base_levels: i8,
    /// Extra levels drawn with `rn2`, zero for none
    pub random_levels: i8,
    pub parent: Option<(BranchId, Attach)>,
    pub link: LinkKind,
    /// Level numbers grow upwards
    pub ascending: bool,
}

/// The standard dungeon layout, in resolution order
pub fn default_branches() -> Vec<BranchDef> {
    vec![
        BranchDef {
            id: BranchId::Main,
            base_levels: 25,
            random_levels: 5,
            parent: None,
            link: LinkKind::StairsDown,
            ascending: false,
        },
        BranchDef {
            id: BranchId::Mines,
            base_levels: 8,
            random_levels: 0,
            parent: Some((BranchId::Main, Attach::Range { lo: 2, hi: 4 })),
            link: LinkKind::StairsDown,
            ascending: false,
        },
        BranchDef {
            id: BranchId::Sokoban,
            base_levels: 4,
            random_levels: 0,
            parent: Some((BranchId::Main, Attach::Range { lo: 6, hi: 9 })),
            link: LinkKind::StairsUp,
            ascending: true,
        },
        BranchDef {
            id: BranchId::Quest,
            base_levels: 5,
            random_levels: 0,
            parent: Some((BranchId::Main, Attach::Range { lo: 11, hi: 16 })),
            link: LinkKind::Portal,
            ascending: false,
        },
        BranchDef {
            id: BranchId::Gehennom,
            base_levels: 20,
            random_levels: 0,
            parent: Some((BranchId::Main, Attach::Bottom)),
            link: LinkKind::StairsDown,
            ascending: false,
        },
        BranchDef {
            id: BranchId::Planes,
            base_levels: 5,
            random_levels: 0,
            parent: Some((BranchId::Gehennom, Attach::Bottom)),
            link: LinkKind::Portal,
            ascending: false,
        },
    ]
}

/// A branch with its size and attachment resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: BranchId,
    pub num_levels: i8,
    /// Parent level this branch hangs off
    pub attachment: Option<DLevel>,
    pub link: LinkKind,
    pub ascending: bool,
}

/// A connection from a level into another branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchLink {
    pub kind: LinkKind,
    pub destination: DLevel,
}

/// Stairs and portals a level must carry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StairPlan {
    pub up: Option<DLevel>,
    pub down: Option<DLevel>,
    pub branch: Option<BranchLink>,
}

/// Resolved dungeon layout for one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    branches: Vec<Branch>,
}

impl Topology {
    /// Resolve sizes, then attachment depths, in declaration order
    pub fn resolve(defs: &[BranchDef], rng: &mut GameRng) -> Result<Self> {
        let mut branches: Vec<Branch> = defs
            .iter()
            .map(|def| {
                let extra = if def.random_levels > 0 {
                    rng.rn2(def.random_levels as u32) as i8
                } else {
                    0
                };
                Branch {
                    id: def.id,
                    num_levels: def.base_levels + extra,
                    attachment: None,
                    link: def.link,
                    ascending: def.ascending,
                }
            })
            .collect();

        for (i, def) in defs.iter().enumerate() {
            let Some((parent, attach)) = def.parent else {
                continue;
            };
            let parent_levels = branches
                .iter()
                .find(|b| b.id == parent)
                .map(|b| b.num_levels)
                .ok_or_else(|| GenError::UnknownBranch(parent.to_string()))?;
            let (lo, hi) = match attach {
                Attach::Range { lo, hi } => (lo, hi.min(parent_levels)),
                Attach::Bottom => (parent_levels, parent_levels),
            };
            let taken = |depth: i8| {
                branches
                    .iter()
                    .any(|b| b.attachment == Some(DLevel::new(parent, depth)))
            };
            let no_room = GenError::NoAttachmentDepth {
                branch: def.id,
                parent,
                lo,
                hi,
            };
            if lo > hi {
                return Err(no_room);
            }
            let wanted = if hi > lo {
                lo + rng.rn2((hi - lo + 1) as u32) as i8
            } else {
                lo
            };
            let depth = (wanted..=hi)
                .chain(lo..wanted)
                .find(|&d| !taken(d))
                .ok_or(no_room)?;
            debug!("{} attaches to {}:{}", def.id, parent, depth);
            branches[i].attachment = Some(DLevel::new(parent, depth));
        }
        Ok(Self { branches })
    }

    /// The standard dungeon
    pub fn standard(rng: &mut GameRng) -> Result<Self> {
        Self::resolve(&default_branches(), rng)
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn branch(&self, id: BranchId) -> Option<&Branch> {
        self.branches.iter().find(|b| b.id == id)
    }

    pub fn num_levels(&self, id: BranchId) -> Option<i8> {
        self.branch(id).map(|b| b.num_levels)
    }

    /// Parent level a branch hangs off
    pub fn attachment(&self, id: BranchId) -> Option<DLevel> {
        self.branch(id).and_then(|b| b.attachment)
    }

    pub fn contains(&self, dlevel: DLevel) -> bool {
        self.branch(dlevel.branch)
            .is_some_and(|b| dlevel.depth >= 1 && dlevel.depth <= b.num_levels)
    }

    /// Reject coordinates outside every branch
    pub fn validate(&self, dlevel: DLevel) -> Result<()> {
        let branch = self
            .branch(dlevel.branch)
            .ok_or_else(|| GenError::UnknownBranch(dlevel.branch.to_string()))?;
        if dlevel.depth < 1 || dlevel.depth > branch.num_levels {
            return Err(GenError::DepthOutOfRange {
                branch: dlevel.branch,
                depth: dlevel.depth,
                levels: branch.num_levels,
            });
        }
        Ok(())
    }

    /// Which stairs and portals a level carries
    pub fn stair_plan(&self, dlevel: DLevel) -> StairPlan {
        let Some(branch) = self.branch(dlevel.branch) else {
            return StairPlan::default();
        };
        let d = dlevel.depth;
        let prev = (d > 1).then(|| dlevel.offset(-1));
        let next = (d < branch.num_levels).then(|| dlevel.offset(1));
        let (up, down) = if branch.ascending {
            (next, prev)
        } else {
            (prev, next)
        };

        let child = self.branches.iter().find(|b| b.attachment == Some(dlevel));
        let link = match child {
            Some(child) => Some(BranchLink {
                kind: child.link,
                destination: DLevel::new(child.id, 1),
            }),
            None if d == 1 => branch.attachment.map(|parent| BranchLink {
                kind: branch.link.reversed(),
                destination: parent,
            }),
            None => None,
        };
        StairPlan {
            up,
            down,
            branch: link,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard(seed: u64) -> Topology {
        Topology::standard(&mut GameRng::new(seed)).unwrap()
    }

    #[test]
    fn test_sizes_and_ranges() {
        for seed in 0..50 {
            let topo = standard(seed);
            let main = topo.num_levels(BranchId::Main).unwrap();
            assert!((25..30).contains(&main));
            let mines = topo.attachment(BranchId::Mines).unwrap();
            assert_eq!(mines.branch, BranchId::Main);
            assert!((2..=4).contains(&mines.depth));
            let soko = topo.attachment(BranchId::Sokoban).unwrap();
            assert!((6..=9).contains(&soko.depth));
            assert_eq!(
                topo.attachment(BranchId::Gehennom),
                Some(DLevel::new(BranchId::Main, main))
            );
            assert_eq!(
                topo.attachment(BranchId::Planes),
                Some(DLevel::new(BranchId::Gehennom, 20))
            );
        }
    }

    #[test]
    fn test_resolution_draw_count() {
        let mut rng = GameRng::new(9);
        Topology::standard(&mut rng).unwrap();
        // main size, mines, sokoban, quest; bottom attachments are free
        assert_eq!(rng.call_count(), 4);
    }

    #[test]
    fn test_collision_takes_next_free_depth() {
        let defs = vec![
            BranchDef {
                id: BranchId::Main,
                base_levels: 10,
                random_levels: 0,
                parent: None,
                link: LinkKind::StairsDown,
                ascending: false,
            },
            BranchDef {
                id: BranchId::Mines,
                base_levels: 3,
                random_levels: 0,
                parent: Some((BranchId::Main, Attach::Range { lo: 3, hi: 3 })),
                link: LinkKind::StairsDown,
                ascending: false,
            },
            BranchDef {
                id: BranchId::Quest,
                base_levels: 3,
                random_levels: 0,
                parent: Some((BranchId::Main, Attach::Range { lo: 3, hi: 4 })),
                link: LinkKind::Portal,
                ascending: false,
            },
        ];
        for seed in 0..20 {
            let topo = Topology::resolve(&defs, &mut GameRng::new(seed)).unwrap();
            assert_eq!(topo.attachment(BranchId::Quest).unwrap().depth, 4);
        }
    }

    #[test]
    fn test_exhausted_range_is_fatal() {
        let defs = vec![
            BranchDef {
                id: BranchId::Main,
                base_levels: 10,
                random_levels: 0,
                parent: None,
                link: LinkKind::StairsDown,
                ascending: false,
            },
            BranchDef {
                id: BranchId::Mines,
                base_levels: 3,
                random_levels: 0,
                parent: Some((BranchId::Main, Attach::Range { lo: 3, hi: 3 })),
                link: LinkKind::StairsDown,
                ascending: false,
            },
            BranchDef {
                id: BranchId::Quest,
                base_levels: 3,
                random_levels: 0,
                parent: Some((BranchId::Main, Attach::Range { lo: 3, hi: 3 })),
                link: LinkKind::Portal,
                ascending: false,
            },
        ];
        let err = Topology::resolve(&defs, &mut GameRng::new(1)).unwrap_err();
        assert!(matches!(err, GenError::NoAttachmentDepth { branch: BranchId::Quest, .. }));
    }

    #[test]
    fn test_stair_plans() {
        let topo = standard(42);
        let top = topo.stair_plan(DLevel::new(BranchId::Main, 1));
        assert_eq!(top.up, None);
        assert_eq!(top.down, Some(DLevel::new(BranchId::Main, 2)));
        assert_eq!(top.branch, None);

        let mines_at = topo.attachment(BranchId::Mines).unwrap();
        let plan = topo.stair_plan(mines_at);
        assert_eq!(
            plan.branch,
            Some(BranchLink {
                kind: LinkKind::StairsDown,
                destination: DLevel::new(BranchId::Mines, 1)
            })
        );
        let entry = topo.stair_plan(DLevel::new(BranchId::Mines, 1));
        assert_eq!(entry.up, None);
        assert_eq!(
            entry.branch,
            Some(BranchLink {
                kind: LinkKind::StairsUp,
                destination: mines_at
            })
        );

        let soko = topo.stair_plan(DLevel::new(BranchId::Sokoban, 1));
        assert_eq!(soko.up, Some(DLevel::new(BranchId::Sokoban, 2)));
        assert_eq!(soko.down, None);
        assert_eq!(soko.branch.map(|l| l.kind), Some(LinkKind::StairsDown));

        let main_bottom = topo.num_levels(BranchId::Main).unwrap();
        let bottom = topo.stair_plan(DLevel::new(BranchId::Main, main_bottom));
        assert_eq!(bottom.down, None);
        assert_eq!(
            bottom.branch.map(|l| l.destination),
            Some(DLevel::new(BranchId::Gehennom, 1))
        );
    }

    #[test]
    fn test_validate() {
        let topo = standard(1);
        assert!(topo.validate(DLevel::new(BranchId::Mines, 8)).is_ok());
        assert!(matches!(
            topo.validate(DLevel::new(BranchId::Mines, 9)),
            Err(GenError::DepthOutOfRange { levels: 8, .. })
        ));
        assert!(topo.validate(DLevel::new(BranchId::Main, 0)).is_err());
    }

    #[test]
    fn test_branch_names_parse() {
        assert_eq!("mines".parse::<BranchId>().ok(), Some(BranchId::Mines));
        assert_eq!("Gehennom".parse::<BranchId>().ok(), Some(BranchId::Gehennom));
        assert!("atlantis".parse::<BranchId>().is_err());
    }
}
