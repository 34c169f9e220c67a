//! Typed variable storage (§3.2, §4.C): three parallel slot arrays, one
//! per `VarKind`. Arrays grow lazily on first write to an index past their
//! current length and never shrink; reading an unwritten slot returns that
//! kind's zero value.

use crate::ast::{VarKind, VarRef};
use crate::world::{EntityId, Pos, NO_ENTITY};
use serde::{Deserialize, Serialize};

/// A runtime value of unspecified kind, as produced by expression
/// evaluation. Scripts only ever compare/branch on `Int`-shaped values;
/// `Obj` and `Pos` values only ever flow into/out of variable slots and
/// dispatch arguments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i32),
    Obj(EntityId),
    Pos(Pos),
}

impl Value {
    /// C-style truthiness: any nonzero int, any valid entity, any value at
    /// all for `Pos` (positions have no concept of falseness).
    pub fn truthy(&self) -> bool {
        match self {
            Value::Int(i) => *i != 0,
            Value::Obj(e) => *e != NO_ENTITY,
            Value::Pos(_) => true,
        }
    }

    pub fn as_int(&self) -> i32 {
        match self {
            Value::Int(i) => *i,
            Value::Obj(e) => *e as i32,
            Value::Pos(_) => 0,
        }
    }

    pub fn as_obj(&self) -> EntityId {
        match self {
            Value::Obj(e) => *e,
            Value::Int(i) => *i as EntityId,
            Value::Pos(_) => NO_ENTITY,
        }
    }

    pub fn as_pos(&self) -> Pos {
        match self {
            Value::Pos(p) => *p,
            _ => Pos::ZERO,
        }
    }
}

/// The three parallel variable slot arrays for one script instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Slots {
    int_vars: Vec<i32>,
    obj_vars: Vec<EntityId>,
    pos_vars: Vec<Pos>,
}

impl Slots {
    /// Pre-size the `Int`/`Obj`/`Pos` arrays, e.g. from the `.tok` header's
    /// declared variable-slot count (§6.1). Growth beyond this at runtime
    /// is still permitted; this only avoids repeated reallocation.
    pub fn with_capacity(int_slots: usize, obj_slots: usize, pos_slots: usize) -> Self {
        Self {
            int_vars: vec![0; int_slots],
            obj_vars: vec![NO_ENTITY; obj_slots],
            pos_vars: vec![Pos::ZERO; pos_slots],
        }
    }

    fn grow_int(&mut self, index: usize) {
        if index >= self.int_vars.len() {
            self.int_vars.resize(index + 1, 0);
        }
    }

    fn grow_obj(&mut self, index: usize) {
        if index >= self.obj_vars.len() {
            self.obj_vars.resize(index + 1, NO_ENTITY);
        }
    }

    fn grow_pos(&mut self, index: usize) {
        if index >= self.pos_vars.len() {
            self.pos_vars.resize(index + 1, Pos::ZERO);
        }
    }

    pub fn get(&self, slot: VarRef) -> Value {
        let index = slot.index as usize;
        match slot.kind {
            VarKind::Int => Value::Int(self.int_vars.get(index).copied().unwrap_or(0)),
            VarKind::Obj => Value::Obj(self.obj_vars.get(index).copied().unwrap_or(NO_ENTITY)),
            VarKind::Pos => Value::Pos(self.pos_vars.get(index).copied().unwrap_or(Pos::ZERO)),
        }
    }

    /// Writes `value` into `slot`, coercing it to the slot's own kind
    /// rather than the value's (§4.C: writes always coerce to the
    /// destination kind).
    pub fn set(&mut self, slot: VarRef, value: Value) {
        let index = slot.index as usize;
        match slot.kind {
            VarKind::Int => {
                self.grow_int(index);
                self.int_vars[index] = value.as_int();
            }
            VarKind::Obj => {
                self.grow_obj(index);
                self.obj_vars[index] = value.as_obj();
            }
            VarKind::Pos => {
                self.grow_pos(index);
                self.pos_vars[index] = value.as_pos();
            }
        }
    }

    pub fn int_len(&self) -> usize {
        self.int_vars.len()
    }

    pub fn obj_len(&self) -> usize {
        self.obj_vars.len()
    }

    pub fn pos_len(&self) -> usize {
        self.pos_vars.len()
    }

    pub fn int_vars(&self) -> &[i32] {
        &self.int_vars
    }

    pub fn obj_vars(&self) -> &[EntityId] {
        &self.obj_vars
    }

    pub fn pos_vars(&self) -> &[Pos] {
        &self.pos_vars
    }

    pub fn set_int_vars(&mut self, vars: Vec<i32>) {
        self.int_vars = vars;
    }

    pub fn set_obj_vars(&mut self, vars: Vec<EntityId>) {
        self.obj_vars = vars;
    }

    pub fn set_pos_vars(&mut self, vars: Vec<Pos>) {
        self.pos_vars = vars;
    }
}
