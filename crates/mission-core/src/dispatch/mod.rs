//! Host function dispatch (§4.E): the bridge between the decoded AST's
//! `Call` nodes and the world/rng/side/event state a call actually
//! touches.
//!
//! Handlers are looked up by name through the function table
//! (`decoder::tables`) rather than matched on id directly, so the id
//! space and the behavior space can be reasoned about independently — a
//! call to an unnamed/reserved id simply has no entry here and evaluates
//! to `Value::Int(0)` with a logged warning (§7.2, §9 "Dispatch as a
//! finite switch": despite its size the dispatcher is still a pure,
//! total, finite switch over `funcId`, never late-bound).

pub mod handlers;
pub mod state;
pub mod table;

use crate::ast::VarRef;
use crate::events::EventLog;
use crate::value::{Slots, Value};
use crate::world::WorldView;
use state::DispatchState;

/// One evaluated call argument: most are plain values, but a handful of
/// `Event*` calls treat one positional argument as an out-var lvalue
/// rather than a value to read (§4.E group 14, §6.2).
#[derive(Debug, Clone)]
pub enum EvalArg {
    Value(Value),
    OutVar(VarRef),
}

impl EvalArg {
    pub fn value(&self) -> Value {
        match self {
            EvalArg::Value(v) => *v,
            EvalArg::OutVar(_) => Value::Int(0),
        }
    }
}

/// Bundles every piece of mutable state a handler might touch for one
/// call. Each field is borrowed independently so multiple `&mut` fields
/// coexist without conflict.
pub struct DispatchCtx<'a> {
    pub state: &'a mut DispatchState,
    pub events: &'a mut EventLog,
    pub world: &'a mut dyn WorldView,
    pub slots: &'a mut Slots,
    /// The host's string table (§4.H): `Expr::StringRef` evaluates to
    /// `Value::Int(index)`; handlers that need the literal text resolve
    /// it through here rather than carrying strings through `Value`
    /// itself.
    pub string_table: &'a [String],
}

impl<'a> DispatchCtx<'a> {
    pub fn string_at(&self, index: i32) -> &str {
        self.string_table
            .get(index as usize)
            .map(String::as_str)
            .unwrap_or("")
    }
}

pub type HandlerFn = fn(&mut DispatchCtx, &[EvalArg]) -> Value;

/// Dispatches a call by function id. Ids with no bound handler (the
/// `UnusedNN` reserved tail, and any id the decoder let through that the
/// corpus never actually emits) log one warning and return `Value::Int(0)`
/// without side effects (§7.2).
pub fn dispatch(ctx: &mut DispatchCtx, func_id: u16, args: &[EvalArg]) -> Value {
    match table::handler_for(func_id) {
        Some(handler) => handler(ctx, args),
        None => {
            log::warn!("dispatch: unhandled function id {func_id}");
            Value::Int(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::tables::function_id_by_name;

    fn new_ctx_parts() -> (
        crate::world::tests_support::NullWorld,
        EventLog,
        Slots,
        DispatchState,
        Vec<String>,
    ) {
        (
            crate::world::tests_support::NullWorld::default(),
            EventLog::default(),
            Slots::default(),
            DispatchState::new(1),
            Vec::new(),
        )
    }

    #[test]
    fn unnamed_reserved_id_dispatches_to_zero() {
        let (mut world, mut events, mut slots, mut state, string_table) = new_ctx_parts();
        let mut ctx = DispatchCtx {
            state: &mut state,
            events: &mut events,
            world: &mut world,
            slots: &mut slots,
            string_table: &string_table,
        };
        let result = dispatch(&mut ctx, 161, &[]);
        assert_eq!(result, Value::Int(0));
    }

    #[test]
    fn named_function_has_a_handler() {
        let id = function_id_by_name("ModelTick").unwrap();
        let (mut world, mut events, mut slots, mut state, string_table) = new_ctx_parts();
        let mut ctx = DispatchCtx {
            state: &mut state,
            events: &mut events,
            world: &mut world,
            slots: &mut slots,
            string_table: &string_table,
        };
        assert_eq!(dispatch(&mut ctx, id, &[]), Value::Int(0));
    }
}
