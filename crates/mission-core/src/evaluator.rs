//! The reactive, tick-driven evaluator (§4.D). One `tick(current_tick)`
//! call walks every top-level `Block` exactly once, top to bottom,
//! evaluating its condition and running its `body` or `else_body`
//! accordingly, then clears the per-tick event log. There is no program
//! counter and no suspension inside a tick: the whole program runs to
//! quiescence synchronously (§4.D, §5).

use crate::ast::{BinOp, Call, Expr, Program, Stmt, VarKind};
use crate::dispatch::{self, DispatchCtx, EvalArg};
use crate::events::EventLog;
use crate::value::{Slots, Value};
use crate::world::{Pos, WorldView};

/// Evaluates one call's argument expressions into `EvalArg`s, honoring
/// the function table's `out_var_arg` convention: the flagged positional
/// argument must itself be a bare `Var` reference (an lvalue), evaluated
/// as an out-var rather than read as a value (§4.E group 14).
fn eval_call_args(
    program_ctx: &mut EvalCtx,
    string_table: &[String],
    call: &Call,
) -> Vec<EvalArg> {
    let out_var_arg = crate::dispatch::table::out_var_arg_for(call.func_id);
    call.args
        .iter()
        .enumerate()
        .map(|(i, arg)| {
            if Some(i as u8) == out_var_arg {
                if let Expr::Var(slot) = arg {
                    return EvalArg::OutVar(*slot);
                }
            }
            EvalArg::Value(eval_expr(program_ctx, string_table, arg))
        })
        .collect()
}

/// Bundles everything a single expression evaluation or call dispatch
/// needs, borrowed for the duration of one `tick`.
pub struct EvalCtx<'a> {
    pub slots: &'a mut Slots,
    pub events: &'a mut EventLog,
    pub world: &'a mut dyn WorldView,
    pub dispatch: &'a mut crate::dispatch::state::DispatchState,
}

fn eval_expr(ctx: &mut EvalCtx, string_table: &[String], expr: &Expr) -> Value {
    match expr {
        Expr::IntLit(v) => Value::Int(*v),
        Expr::BoolLit(b) => Value::Int(*b as i32),
        Expr::StringRef(idx) => Value::Int(*idx as i32),
        Expr::Var(slot) => ctx.slots.get(*slot),
        Expr::Call(call) => eval_call(ctx, string_table, call),
        Expr::Binary(op, lhs, rhs) => {
            // Strict evaluation: both operands always run, even for `&&`
            // and `||`, because either side may be a `Call` with side
            // effects the original VM always performs (§4.D).
            let lv = eval_expr(ctx, string_table, lhs);
            let rv = eval_expr(ctx, string_table, rhs);
            eval_binary(*op, lv, rv)
        }
    }
}

/// Mixing a number and a position on either side of a comparison or
/// arithmetic operator silently treats the position side as 0 (§4.D
/// "Expression semantics").
fn numeric(value: Value) -> i32 {
    match value {
        Value::Pos(_) => 0,
        other => other.as_int(),
    }
}

fn eval_binary(op: BinOp, lhs: Value, rhs: Value) -> Value {
    let l = numeric(lhs);
    let r = numeric(rhs);
    let result = match op {
        BinOp::And => ((l != 0) && (r != 0)) as i32,
        BinOp::Or => ((l != 0) || (r != 0)) as i32,
        BinOp::Eq => (l == r) as i32,
        BinOp::Ne => (l != r) as i32,
        BinOp::Ge => (l >= r) as i32,
        BinOp::Le => (l <= r) as i32,
        BinOp::Gt => (l > r) as i32,
        BinOp::Lt => (l < r) as i32,
        BinOp::Add => l.wrapping_add(r),
        BinOp::Sub => l.wrapping_sub(r),
    };
    Value::Int(result)
}

fn eval_call(ctx: &mut EvalCtx, string_table: &[String], call: &Call) -> Value {
    let args = eval_call_args(ctx, string_table, call);
    let mut dispatch_ctx = DispatchCtx {
        state: ctx.dispatch,
        events: ctx.events,
        world: ctx.world,
        slots: ctx.slots,
        string_table,
    };
    dispatch::dispatch(&mut dispatch_ctx, call.func_id, &args)
}

fn exec_stmts(ctx: &mut EvalCtx, string_table: &[String], stmts: &[Stmt]) {
    for stmt in stmts {
        exec_stmt(ctx, string_table, stmt);
    }
}

fn exec_stmt(ctx: &mut EvalCtx, string_table: &[String], stmt: &Stmt) {
    match stmt {
        Stmt::Block(block) => exec_block(ctx, string_table, block),
        Stmt::Assign { slot, value } => {
            // Right-hand side is evaluated before the write; the write
            // itself is atomic at the slot (§4.D "Assignment semantics").
            let value = eval_expr(ctx, string_table, value);
            ctx.slots.set(*slot, value);
        }
        Stmt::Call(call) => {
            eval_call(ctx, string_table, call);
        }
    }
}

fn exec_block(ctx: &mut EvalCtx, string_table: &[String], block: &crate::ast::Block) {
    let cond = eval_expr(ctx, string_table, &block.condition);
    if cond.truthy() {
        exec_stmts(ctx, string_table, &block.body);
    } else {
        exec_stmts(ctx, string_table, &block.else_body);
    }
}

/// Runs one full tick: every top-level block is visited exactly once, in
/// source order, then the event log is cleared (§4.D "Per-tick
/// contract"). `current_tick` feeds `ModelTick()`'s dispatch handler via
/// `dispatch::state::DispatchState::tick`, which the caller is expected to
/// have advanced (or not) before calling this — the evaluator itself does
/// not mutate the tick counter, only reads it through dispatch.
pub fn tick(
    program: &Program,
    slots: &mut Slots,
    events: &mut EventLog,
    world: &mut dyn WorldView,
    dispatch_state: &mut crate::dispatch::state::DispatchState,
    string_table: &[String],
) {
    let mut ctx = EvalCtx {
        slots,
        events,
        world,
        dispatch: dispatch_state,
    };
    for block in &program.blocks {
        exec_block(&mut ctx, string_table, block);
    }
    ctx.events.clear();
}

/// Helper for `Assign`-adjacent call sites that need a slot's declared
/// default (zero-value) without reading it, e.g. host bootstrapping.
pub fn zero_value(kind: VarKind) -> Value {
    match kind {
        VarKind::Int => Value::Int(0),
        VarKind::Obj => Value::Obj(crate::world::NO_ENTITY),
        VarKind::Pos => Value::Pos(Pos::ZERO),
    }
}
