//! Level script registry with cached variant choice
//!
//! A dungeon coordinate may have several interchangeable scripts. The first
//! request for that coordinate picks one with a single weighted draw; later
//! requests return the same script without drawing.

use hashbrown::HashMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{GenError, Result};
use crate::rng::GameRng;

use super::des::Script;
use super::DLevel;

/// One candidate script and its relative weight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub script: Script,
    pub weight: u32,
}

impl Variant {
    pub fn new(script: Script) -> Self {
        Self { script, weight: 1 }
    }

    pub fn weighted(script: Script, weight: u32) -> Self {
        Self { script, weight }
    }
}

/// Scripts per dungeon coordinate, plus the session's choices
#[derive(Debug, Clone, Default)]
pub struct Registry {
    levels: HashMap<DLevel, Vec<Variant>>,
    choices: HashMap<DLevel, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the variants for a coordinate, replacing earlier ones
    ///
    /// A non-empty list whose weights sum to zero is rejected.
    pub fn register(&mut self, dlevel: DLevel, variants: Vec<Variant>) -> Result<()> {
        if !variants.is_empty() && variants.iter().all(|v| v.weight == 0) {
            return Err(GenError::ZeroVariantWeight(dlevel));
        }
        self.choices.remove(&dlevel);
        if variants.is_empty() {
            self.levels.remove(&dlevel);
        } else {
            self.levels.insert(dlevel, variants);
        }
        Ok(())
    }

    pub fn is_registered(&self, dlevel: DLevel) -> bool {
        self.levels.contains_key(&dlevel)
    }

    pub fn variants(&self, dlevel: DLevel) -> Option<&[Variant]> {
        self.levels.get(&dlevel).map(Vec::as_slice)
    }

    /// The script for a coordinate, choosing a variant on first access
    ///
    /// A single variant is taken without drawing. With several, one
    /// `rn2(total_weight)` draw picks the variant and the choice is kept
    /// for the rest of the session.
    pub fn select(&mut self, dlevel: DLevel, rng: &mut GameRng) -> Option<&Script> {
        let variants = self.levels.get(&dlevel)?;
        let index = match self.choices.get(&dlevel) {
            Some(&index) => index,
            None => {
                let index = if variants.len() == 1 {
                    0
                } else {
                    let total: u32 = variants.iter().map(|v| v.weight).sum();
                    let mut roll = rng.rn2(total);
                    variants
                        .iter()
                        .position(|v| {
                            if roll < v.weight {
                                true
                            } else {
                                roll -= v.weight;
                                false
                            }
                        })
                        .unwrap_or(variants.len() - 1)
                };
                debug!(
                    "{dlevel}: variant {index} of {} ('{}')",
                    variants.len(),
                    variants[index].script.id
                );
                self.choices.insert(dlevel, index);
                index
            }
        };
        variants.get(index).map(|v| &v.script)
    }

    /// Variant already chosen for a coordinate
    pub fn choice(&self, dlevel: DLevel) -> Option<usize> {
        self.choices.get(&dlevel).copied()
    }

    /// Choices made so far, sorted by coordinate
    pub fn choices(&self) -> Vec<(DLevel, usize)> {
        let mut choices: Vec<(DLevel, usize)> =
            self.choices.iter().map(|(&d, &i)| (d, i)).collect();
        choices.sort();
        choices
    }

    /// Reinstate choices from a saved session
    pub fn restore_choices(&mut self, choices: &[(DLevel, usize)]) {
        self.choices = choices.iter().copied().collect();
    }

    /// Forget every choice; done when a session starts
    pub fn clear_choices(&mut self) {
        self.choices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::BranchId;

    fn three_variants() -> Vec<Variant> {
        vec![
            Variant::new(Script::new("a")),
            Variant::weighted(Script::new("b"), 2),
            Variant::new(Script::new("c")),
        ]
    }

    #[test]
    fn test_single_variant_costs_no_draw() {
        let mut registry = Registry::new();
        let here = DLevel::new(BranchId::Main, 5);
        registry
            .register(here, vec![Variant::new(Script::new("oracle"))])
            .unwrap();
        let mut rng = GameRng::new(1);
        assert_eq!(registry.select(here, &mut rng).map(|s| s.id.as_str()), Some("oracle"));
        assert_eq!(rng.call_count(), 0);
    }

    #[test]
    fn test_choice_is_cached() {
        let mut registry = Registry::new();
        let here = DLevel::new(BranchId::Main, 12);
        registry.register(here, three_variants()).unwrap();
        let mut rng = GameRng::new(77);
        let first = registry.select(here, &mut rng).map(|s| s.id.clone());
        let second = registry.select(here, &mut rng).map(|s| s.id.clone());
        assert_eq!(first, second);
        assert_eq!(rng.call_count(), 1);
        assert!(registry.choice(here).is_some());
    }

    #[test]
    fn test_unregistered_level() {
        let mut registry = Registry::new();
        let mut rng = GameRng::new(1);
        assert!(registry.select(DLevel::new(BranchId::Mines, 3), &mut rng).is_none());
        assert_eq!(rng.call_count(), 0);
    }

    #[test]
    fn test_weights_are_respected() {
        let mut counts = [0u32; 3];
        for seed in 0..300 {
            let mut registry = Registry::new();
            let here = DLevel::new(BranchId::Main, 12);
            registry.register(here, three_variants()).unwrap();
            let mut rng = GameRng::new(seed);
            registry.select(here, &mut rng);
            counts[registry.choice(here).unwrap()] += 1;
        }
        assert!(counts[1] > counts[0]);
        assert!(counts[1] > counts[2]);
    }

    #[test]
    fn test_zero_total_weight_is_rejected() {
        let mut registry = Registry::new();
        let here = DLevel::new(BranchId::Main, 12);
        let result = registry.register(
            here,
            vec![
                Variant::weighted(Script::new("a"), 0),
                Variant::weighted(Script::new("b"), 0),
            ],
        );
        assert!(matches!(result, Err(GenError::ZeroVariantWeight(d)) if d == here));
        assert!(!registry.is_registered(here));

        registry
            .register(
                here,
                vec![Variant::weighted(Script::new("a"), 0), Variant::new(Script::new("b"))],
            )
            .unwrap();
        let mut rng = GameRng::new(3);
        assert_eq!(registry.select(here, &mut rng).map(|s| s.id.as_str()), Some("b"));
    }

    #[test]
    fn test_clear_and_restore_choices() {
        let mut registry = Registry::new();
        let here = DLevel::new(BranchId::Main, 12);
        registry.register(here, three_variants()).unwrap();
        registry.restore_choices(&[(here, 2)]);
        let mut rng = GameRng::new(5);
        assert_eq!(registry.select(here, &mut rng).map(|s| s.id.as_str()), Some("c"));
        assert_eq!(rng.call_count(), 0);
        registry.clear_choices();
        assert!(registry.choices().is_empty());
    }
}
