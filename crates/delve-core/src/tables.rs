//! Content identity tables
//!
//! The builders only decide *when* a random monster or object is drawn.
//! What that draw means is delegated to a [`ContentTables`] implementation,
//! so real monster/object tables can be plugged in by the game.

use serde::{Deserialize, Serialize};

use crate::rng::GameRng;

/// Opaque reference to a monster or object type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ident {
    /// Index into an external table
    Index(u16),
    /// A specific named type ("shopkeeper", "boulder")
    Name(String),
    /// Any member of a class, identified by its map symbol
    Class(char),
}

impl Ident {
    pub fn named(name: &str) -> Self {
        Ident::Name(name.to_string())
    }
}

impl core::fmt::Display for Ident {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Ident::Index(i) => write!(f, "#{i}"),
            Ident::Name(name) => f.write_str(name),
            Ident::Class(c) => write!(f, "class '{c}'"),
        }
    }
}

/// Source of random monster and object identities
pub trait ContentTables {
    /// Pick a monster suitable for `depth`, optionally restricted to a class
    fn random_monster(&self, rng: &mut GameRng, depth: i8, class: Option<char>) -> Ident;

    /// Pick an object, optionally restricted to a class
    fn random_object(&self, rng: &mut GameRng, class: Option<char>) -> Ident;
}

/// Tables that spend exactly one draw per identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniformTables {
    pub monster_count: u16,
    pub object_count: u16,
}

impl Default for UniformTables {
    fn default() -> Self {
        Self {
            monster_count: 381,
            object_count: 453,
        }
    }
}

impl ContentTables for UniformTables {
    fn random_monster(&self, rng: &mut GameRng, _depth: i8, _class: Option<char>) -> Ident {
        Ident::Index(rng.rn2(u32::from(self.monster_count.max(1))) as u16)
    }

    fn random_object(&self, rng: &mut GameRng, _class: Option<char>) -> Ident {
        Ident::Index(rng.rn2(u32::from(self.object_count.max(1))) as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_tables_one_draw_each() {
        let tables = UniformTables::default();
        let mut rng = GameRng::new(3);
        tables.random_monster(&mut rng, 5, Some('d'));
        assert_eq!(rng.call_count(), 1);
        tables.random_object(&mut rng, None);
        assert_eq!(rng.call_count(), 2);
    }

    #[test]
    fn test_ident_display() {
        assert_eq!(Ident::Index(7).to_string(), "#7");
        assert_eq!(Ident::named("boulder").to_string(), "boulder");
        assert_eq!(Ident::Class('$').to_string(), "class '$'");
    }
}
