//! Per-tick event log (§3.4): a multiset of `Fact`s raised during the
//! current tick's evaluation, cleared in full once the tick finishes.
//! Dispatch group 14 ("Event*") reads this log two ways: plain boolean
//! queries that leave matching facts in place for other blocks to also
//! observe this tick, and *consuming* queries that additionally write a
//! detail (the triggering entity, typically) into an out-var and remove
//! the fact so a second block can't double-fire on the same occurrence.

use crate::world::{EntityId, Side};

#[derive(Debug, Clone, PartialEq)]
pub enum Fact {
    /// Raised for every destroyed object, regardless of owner.
    Destroyed { eid: EntityId },
    /// Raised once per delivered (built and handed over) object.
    Delivered { eid: EntityId },
    /// Raised alongside `Delivered`, scoped to the receiving side — the
    /// two are separate facts so `EventObjectDelivered(side, outVar)` can
    /// filter by side without the generic `Delivered` fact also needing a
    /// side field.
    DeliveredSide { side: Side, eid: EntityId },
    /// An object of any type finished construction for `side`.
    Constructed { side: Side, eid: EntityId },
    /// An object of a specific type finished construction for `side`.
    TypeConstructed {
        side: Side,
        type_name: String,
        eid: EntityId,
    },
    /// `a` ordered an attack against `b`.
    SideAttacksSide { a: Side, b: Side },
    /// `eid` was the target of an attack order from `side`.
    ObjectAttacksSide { eid: EntityId, side: Side },
}

/// The current tick's raised facts. Blocks push into this during
/// evaluation; the interpreter drains it to empty after every tick.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    facts: Vec<Fact>,
}

impl EventLog {
    pub fn push(&mut self, fact: Fact) {
        self.facts.push(fact);
    }

    /// Non-consuming existence check: `true` if any fact matches.
    pub fn any(&self, mut pred: impl FnMut(&Fact) -> bool) -> bool {
        self.facts.iter().any(|f| pred(f))
    }

    /// Removes and returns the first matching fact, if any (consuming
    /// query, used by dispatch calls that also write an out-var).
    pub fn take_first(&mut self, mut pred: impl FnMut(&Fact) -> bool) -> Option<Fact> {
        let index = self.facts.iter().position(|f| pred(f))?;
        Some(self.facts.remove(index))
    }

    pub fn clear(&mut self) {
        self.facts.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fact> {
        self.facts.iter()
    }
}
