//! Side relationship model (§3.3): directed friend/enemy/neutral pairs
//! with lazy defaults. `SideA -> SideB` may differ from `SideB -> SideA`
//! until a script sets one explicitly.

use std::collections::HashMap;

use crate::world::{Side, SIDE_ENEMY, SIDE_NEUTRAL, SIDE_PLAYER};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    Friend,
    Enemy,
    Neutral,
}

impl Relation {
    /// Default relation between two sides before any script sets one
    /// explicitly: a side is always its own friend, the player and the
    /// canonical enemy start hostile, everyone else starts neutral.
    fn default_for(a: Side, b: Side) -> Relation {
        if a == b {
            return Relation::Friend;
        }
        let pair = (a.min(b), a.max(b));
        if pair == (SIDE_PLAYER, SIDE_ENEMY) {
            Relation::Enemy
        } else {
            Relation::Neutral
        }
    }
}

/// Directed side relationships plus the next-allocatable dynamic side id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SideTable {
    relations: HashMap<(Side, Side), Relation>,
    next_dynamic_side: Side,
}

impl Default for SideTable {
    fn default() -> Self {
        Self {
            relations: HashMap::new(),
            // 2..=254 are available for CreateSide; 255 is reserved neutral.
            next_dynamic_side: 2,
        }
    }
}

impl SideTable {
    /// Directed lookup: `relation_of(a, b)` is how `a` treats `b`.
    pub fn relation_of(&self, a: Side, b: Side) -> Relation {
        self.relations
            .get(&(a, b))
            .copied()
            .unwrap_or_else(|| Relation::default_for(a, b))
    }

    /// Sets how `a` treats `b`. One-directional: `b`'s view of `a` is
    /// unaffected unless set separately.
    pub fn set_relation(&mut self, a: Side, b: Side, relation: Relation) {
        self.relations.insert((a, b), relation);
    }

    /// Sets the relation symmetrically in both directions.
    pub fn set_relation_mutual(&mut self, a: Side, b: Side, relation: Relation) {
        self.set_relation(a, b, relation);
        self.set_relation(b, a, relation);
    }

    pub fn is_friend(&self, a: Side, b: Side) -> bool {
        matches!(self.relation_of(a, b), Relation::Friend)
    }

    pub fn is_enemy(&self, a: Side, b: Side) -> bool {
        matches!(self.relation_of(a, b), Relation::Enemy)
    }

    /// Allocates the next free dynamic side id (`CreateSide`), clamping
    /// before it would collide with the neutral sentinel.
    pub fn allocate_side(&mut self) -> Side {
        let id = self.next_dynamic_side;
        self.next_dynamic_side = if id >= SIDE_NEUTRAL - 1 {
            SIDE_NEUTRAL - 1
        } else {
            id + 1
        };
        id
    }

    pub fn explicit_relations(&self) -> impl Iterator<Item = (&(Side, Side), &Relation)> {
        self.relations.iter()
    }

    pub fn set_explicit_relations(&mut self, relations: HashMap<(Side, Side), Relation>) {
        self.relations = relations;
    }

    pub fn next_dynamic_side(&self) -> Side {
        self.next_dynamic_side
    }

    pub fn set_next_dynamic_side(&mut self, side: Side) {
        self.next_dynamic_side = side;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_and_enemy_start_hostile() {
        let table = SideTable::default();
        assert!(table.is_enemy(SIDE_PLAYER, SIDE_ENEMY));
        assert!(table.is_enemy(SIDE_ENEMY, SIDE_PLAYER));
    }

    #[test]
    fn self_relation_is_always_friend() {
        let table = SideTable::default();
        assert!(table.is_friend(SIDE_PLAYER, SIDE_PLAYER));
        assert!(table.is_friend(7, 7));
    }

    #[test]
    fn unset_dynamic_sides_default_neutral() {
        let table = SideTable::default();
        assert_eq!(table.relation_of(SIDE_PLAYER, 5), Relation::Neutral);
    }

    #[test]
    fn set_relation_is_directional_unless_mutual() {
        let mut table = SideTable::default();
        table.set_relation(SIDE_PLAYER, 3, Relation::Friend);
        assert!(table.is_friend(SIDE_PLAYER, 3));
        assert_eq!(table.relation_of(3, SIDE_PLAYER), Relation::Neutral);

        table.set_relation_mutual(SIDE_PLAYER, 4, Relation::Friend);
        assert!(table.is_friend(4, SIDE_PLAYER));
    }

    #[test]
    fn allocate_side_increments_and_avoids_neutral() {
        let mut table = SideTable::default();
        let first = table.allocate_side();
        let second = table.allocate_side();
        assert_eq!(first, 2);
        assert_eq!(second, 3);
        assert_ne!(second, SIDE_NEUTRAL);
    }
}
