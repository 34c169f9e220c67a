//! The reactive mission-scripting runtime (§1-§2): decodes a `.tok`
//! bytecode program, then ticks it against a host-supplied [`WorldView`]
//! once per simulation step. Nothing in this crate owns the entity
//! world, the wall clock, or persistence — those are the host's job; this
//! crate owns only the script's own state (variable slots, dispatch
//! bookkeeping, the per-tick event log) and the pure evaluation of one
//! tick.

pub mod ast;
pub mod decoder;
pub mod dispatch;
pub mod evaluator;
pub mod events;
pub mod rules;
pub mod sides;
pub mod value;
pub mod world;

use ast::{Program, VarKind};
use dispatch::state::DispatchState;
use events::EventLog;
use value::Slots;
use world::WorldView;

/// One loaded and running mission script (§2 "Data flow"). Bundles the
/// parsed program with every piece of state a tick needs beyond the
/// entity world itself.
#[derive(Debug, Clone)]
pub struct Mission {
    program: Program,
    slots: Slots,
    events: EventLog,
    dispatch_state: DispatchState,
    string_table: Vec<String>,
}

impl Mission {
    /// Decodes `bytes` and builds a fresh runtime around it, pre-sizing
    /// the variable slot arrays from the script's own declarations
    /// (§6.1). `seed` drives the deterministic PRNG; `string_table` is
    /// the host's resolved string table that `Expr::StringRef` indexes
    /// into (§4.H).
    pub fn load(bytes: &[u8], seed: u32, string_table: Vec<String>) -> Result<Mission, decoder::container::ContainerError> {
        let decoded = decoder::decode(bytes)?;
        let kinds = decoder::slot_kinds(bytes);
        let (int_len, obj_len, pos_len) = slot_capacities(&kinds, decoded.declared_slot_count);
        Ok(Mission {
            program: decoded.program,
            slots: Slots::with_capacity(int_len, obj_len, pos_len),
            events: EventLog::default(),
            dispatch_state: DispatchState::new(seed),
            string_table,
        })
    }

    /// Runs one simulation tick: advances the tick counter, evaluates
    /// every top-level block once, then clears the event log (§4.D
    /// "Per-tick contract"). `current_tick` is the host's own monotonic
    /// tick counter — the interpreter trusts it rather than maintaining
    /// its own, so `ModelTick()` always agrees with the host's clock.
    pub fn tick(&mut self, current_tick: u64, world: &mut dyn WorldView) {
        self.dispatch_state.tick(current_tick);
        evaluator::tick(
            &self.program,
            &mut self.slots,
            &mut self.events,
            world,
            &mut self.dispatch_state,
            &self.string_table,
        );
    }

    /// Re-initializes runtime state while keeping the decoded program,
    /// for hosts that restart a mission without re-parsing its script
    /// (§4.G "Re-init hygiene"): slots, the event log, and dispatch
    /// bookkeeping are all reset to the state `load` would have produced,
    /// but the PRNG is reseeded explicitly rather than implicitly reused.
    pub fn reset(&mut self, seed: u32) {
        let kinds = self.declared_slot_kinds();
        let (int_len, obj_len, pos_len) = slot_capacities(&kinds, 0);
        self.slots = Slots::with_capacity(int_len, obj_len, pos_len);
        self.events.clear();
        self.dispatch_state = DispatchState::new(seed);
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn slots(&self) -> &Slots {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut Slots {
        &mut self.slots
    }

    pub fn dispatch_state(&self) -> &DispatchState {
        &self.dispatch_state
    }

    pub fn dispatch_state_mut(&mut self) -> &mut DispatchState {
        &mut self.dispatch_state
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Re-derives each referenced slot's kind by walking the already
    /// decoded program, so `reset` doesn't need the original bytes.
    fn declared_slot_kinds(&self) -> std::collections::HashMap<u32, VarKind> {
        let mut kinds = std::collections::HashMap::new();
        fn walk_expr(expr: &ast::Expr, kinds: &mut std::collections::HashMap<u32, VarKind>) {
            match expr {
                ast::Expr::Var(v) => {
                    kinds.insert(v.index, v.kind);
                }
                ast::Expr::Call(c) => {
                    for a in &c.args {
                        walk_expr(a, kinds);
                    }
                }
                ast::Expr::Binary(_, l, r) => {
                    walk_expr(l, kinds);
                    walk_expr(r, kinds);
                }
                _ => {}
            }
        }
        fn walk_stmts(stmts: &[ast::Stmt], kinds: &mut std::collections::HashMap<u32, VarKind>) {
            for stmt in stmts {
                match stmt {
                    ast::Stmt::Block(b) => {
                        walk_expr(&b.condition, kinds);
                        walk_stmts(&b.body, kinds);
                        walk_stmts(&b.else_body, kinds);
                    }
                    ast::Stmt::Assign { slot, value } => {
                        kinds.insert(slot.index, slot.kind);
                        walk_expr(value, kinds);
                    }
                    ast::Stmt::Call(c) => {
                        for a in &c.args {
                            walk_expr(a, kinds);
                        }
                    }
                }
            }
        }
        for block in &self.program.blocks {
            walk_expr(&block.condition, &mut kinds);
            walk_stmts(&block.body, &mut kinds);
            walk_stmts(&block.else_body, &mut kinds);
        }
        kinds
    }
}

/// Derives per-kind slot array lengths from a slot-kind map, at least
/// `declared_minimum` long (the `.tok` header's declared variable-slot
/// count, §6.1) so a script that only ever writes through `Assign`
/// without ever reading back still gets its declared capacity.
fn slot_capacities(
    kinds: &std::collections::HashMap<u32, VarKind>,
    declared_minimum: usize,
) -> (usize, usize, usize) {
    let mut int_len = declared_minimum;
    let mut obj_len = 0;
    let mut pos_len = 0;
    for (index, kind) in kinds {
        let needed = *index as usize + 1;
        match kind {
            VarKind::Int => int_len = int_len.max(needed),
            VarKind::Obj => obj_len = obj_len.max(needed),
            VarKind::Pos => pos_len = pos_len.max(needed),
        }
    }
    (int_len, obj_len, pos_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use world::tests_support::NullWorld;

    fn build_container(leading_empty: usize, segment: &[u8]) -> Vec<u8> {
        let mut payload = Vec::new();
        for _ in 0..leading_empty {
            payload.push(0);
        }
        payload.extend_from_slice(segment);
        let null_count = payload.iter().filter(|&&b| b == 0).count() as u32;
        let mut out = (payload.len() as u32).to_le_bytes().to_vec();
        out.extend_from_slice(&null_count.to_le_bytes());
        out.extend_from_slice(&payload);
        out
    }

    #[test]
    fn load_then_tick_runs_without_panicking() {
        use decoder::tables::{KW_ENDIF, KW_IF};
        let token_stream = [0x80, KW_IF as u8, b'1', 0x80, KW_ENDIF as u8];
        let bytes = build_container(1, &token_stream);
        let mut mission = Mission::load(&bytes, 7, Vec::new()).unwrap();
        let mut world = NullWorld::default();
        mission.tick(1, &mut world);
        assert!(mission.events().is_empty());
    }

    #[test]
    fn reset_clears_event_log_and_reseeds_without_dropping_the_program() {
        use decoder::tables::{KW_ENDIF, KW_IF};
        let token_stream = [0x80, KW_IF as u8, b'1', 0x80, KW_ENDIF as u8];
        let bytes = build_container(1, &token_stream);
        let mut mission = Mission::load(&bytes, 1, Vec::new()).unwrap();
        let blocks_before = mission.program().blocks.len();
        mission.reset(2);
        assert_eq!(mission.program().blocks.len(), blocks_before);
        assert!(mission.events().is_empty());
    }
}
