//! End-to-end scenarios exercising the full evaluator → dispatch → world
//! pipeline (and, for the save/restore cases, the save crate layered on
//! top), each built around a hand-assembled `Program` rather than the
//! `.tok` byte decoder — the decoder and parser already have their own
//! focused unit tests; these are about what a running mission actually
//! does tick over tick.

use std::collections::HashMap;

use mission_core::ast::{BinOp, Block, Call, Expr, Program, Stmt, VarKind, VarRef};
use mission_core::decoder::tables::function_id_by_name;
use mission_core::dispatch::state::DispatchState;
use mission_core::evaluator;
use mission_core::events::{EventLog, Fact};
use mission_core::value::{Slots, Value};
use mission_core::world::{Pos, WorldView};
use mission_core::Mission;
use mission_test::{always_true_tok, StubWorld};

fn func(name: &str) -> u16 {
    function_id_by_name(name).unwrap_or_else(|| panic!("no dispatch function named {name}"))
}

fn int_var(index: u32) -> VarRef {
    VarRef { kind: VarKind::Int, index }
}

fn obj_var(index: u32) -> VarRef {
    VarRef { kind: VarKind::Obj, index }
}

fn eq(lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary(BinOp::Eq, Box::new(lhs), Box::new(rhs))
}

fn and(lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs))
}

fn tick_program(
    program: &Program,
    slots: &mut Slots,
    events: &mut EventLog,
    world: &mut dyn WorldView,
    dispatch: &mut DispatchState,
    string_table: &[String],
) {
    evaluator::tick(program, slots, events, world, dispatch, string_table);
}

/// Scenario: a credit grant guarded by a one-time flag fires exactly
/// once even though its condition keeps re-running every tick.
#[test]
fn credit_grant_fires_exactly_once_across_repeated_ticks() {
    let guard = int_var(0);
    let add_side_cash = func("AddSideCash");

    let program = Program {
        blocks: vec![Block {
            condition: eq(Expr::Var(guard), Expr::IntLit(0)),
            body: vec![
                Stmt::Call(Call {
                    func_id: add_side_cash,
                    args: vec![Expr::IntLit(1), Expr::IntLit(10_000)],
                }),
                Stmt::Assign { slot: guard, value: Expr::IntLit(1) },
            ],
            else_body: vec![],
        }],
    };

    let mut slots = Slots::default();
    let mut events = EventLog::default();
    let mut world = StubWorld::new();
    let mut dispatch = DispatchState::new(1);

    for _ in 0..5 {
        tick_program(&program, &mut slots, &mut events, &mut world, &mut dispatch, &[]);
    }

    assert_eq!(world.side_cash(1), 10_000, "grant must not double up on repeated ticks");
    // Untouched by this script; confirms the guard lives in its own slot.
    assert_eq!(slots.get(int_var(1)), Value::Int(0));
}

/// Scenario: three threshold-gated reinforcement waves, each spawning a
/// fixed unrolled batch of units for the opposing side once its
/// population threshold is crossed, each firing at most once.
#[test]
fn reinforcement_waves_spawn_once_per_threshold_crossing() {
    let wave1_done = int_var(4);
    let wave2_done = int_var(5);
    let wave3_done = int_var(6);
    let new_object = func("NewObject");
    let set_tile_pos = func("SetTilePos");
    let side_unit_count = func("SideUnitCount");

    fn spawn_call(new_object: u16, set_tile_pos: u16, owner: i32, x: i32, z: i32) -> Stmt {
        Stmt::Call(Call {
            func_id: new_object,
            args: vec![
                Expr::StringRef(0),
                Expr::IntLit(owner),
                Expr::Call(Call {
                    func_id: set_tile_pos,
                    args: vec![Expr::IntLit(x), Expr::IntLit(z)],
                }),
            ],
        })
    }

    fn wave_block(
        guard: VarRef,
        threshold: i32,
        owner: i32,
        count: i32,
        new_object: u16,
        set_tile_pos: u16,
        side_unit_count: u16,
    ) -> Block {
        let mut body: Vec<Stmt> = (0..count)
            .map(|i| spawn_call(new_object, set_tile_pos, owner, i, i))
            .collect();
        body.push(Stmt::Assign { slot: guard, value: Expr::IntLit(1) });
        Block {
            condition: and(
                Expr::Binary(
                    BinOp::Ge,
                    Box::new(Expr::Call(Call {
                        func_id: side_unit_count,
                        args: vec![Expr::IntLit(1)],
                    })),
                    Box::new(Expr::IntLit(threshold)),
                ),
                eq(Expr::Var(guard), Expr::IntLit(0)),
            ),
            body,
            else_body: vec![],
        }
    }

    let program = Program {
        blocks: vec![
            wave_block(wave1_done, 5, 2, 7, new_object, set_tile_pos, side_unit_count),
            wave_block(wave2_done, 15, 3, 10, new_object, set_tile_pos, side_unit_count),
            wave_block(wave3_done, 35, 4, 10, new_object, set_tile_pos, side_unit_count),
        ],
    };

    let mut slots = Slots::default();
    let mut events = EventLog::default();
    let mut world = StubWorld::new().with_unit_types(&["unit"]);
    let mut dispatch = DispatchState::new(1);
    let string_table = vec!["unit".to_string()];

    // tick(0): no side-1 units yet, nothing fires.
    tick_program(&program, &mut slots, &mut events, &mut world, &mut dispatch, &string_table);
    assert_eq!(world.live_units_of(2).len(), 0);

    // 5 side-1 units present, tick(1) crosses the wave-1 threshold.
    for _ in 0..5 {
        world.spawn_unit("unit", 1, Pos::ZERO);
    }
    tick_program(&program, &mut slots, &mut events, &mut world, &mut dispatch, &string_table);
    assert_eq!(world.live_units_of(2).len(), 7);
    assert_eq!(slots.get(wave1_done), Value::Int(1));

    // Re-tick with no new side-1 units: wave 1's guard prevents a repeat.
    tick_program(&program, &mut slots, &mut events, &mut world, &mut dispatch, &string_table);
    assert_eq!(world.live_units_of(2).len(), 7);

    // 10 more side-1 units (15 total) crosses the wave-2 threshold.
    for _ in 0..10 {
        world.spawn_unit("unit", 1, Pos::ZERO);
    }
    tick_program(&program, &mut slots, &mut events, &mut world, &mut dispatch, &string_table);
    assert_eq!(world.live_units_of(3).len(), 10);

    // 20 more side-1 units (35 total) crosses the wave-3 threshold.
    for _ in 0..20 {
        world.spawn_unit("unit", 1, Pos::ZERO);
    }
    tick_program(&program, &mut slots, &mut events, &mut world, &mut dispatch, &string_table);
    assert_eq!(world.live_units_of(4).len(), 10);
}

/// Scenario: an event-driven flag is set the tick a fact is raised, and
/// reset on every subsequent tick by an unconditional sibling block that
/// runs ahead of the event check — the per-tick event log never carries
/// a fact across a tick boundary, so the flag is a one-tick pulse.
#[test]
fn event_triggered_flag_is_a_one_tick_pulse() {
    let flag = int_var(1);
    let event_side_attacks_side = func("EventSideAttacksSide");

    let program = Program {
        blocks: vec![
            Block {
                condition: Expr::BoolLit(true),
                body: vec![Stmt::Assign { slot: flag, value: Expr::IntLit(0) }],
                else_body: vec![],
            },
            Block {
                condition: eq(
                    Expr::Call(Call {
                        func_id: event_side_attacks_side,
                        args: vec![Expr::IntLit(0), Expr::IntLit(1)],
                    }),
                    Expr::IntLit(1),
                ),
                body: vec![Stmt::Assign { slot: flag, value: Expr::IntLit(1) }],
                else_body: vec![],
            },
        ],
    };

    let mut slots = Slots::default();
    let mut events = EventLog::default();
    let mut world = StubWorld::new();
    let mut dispatch = DispatchState::new(1);

    events.push(Fact::SideAttacksSide { a: 0, b: 1 });
    tick_program(&program, &mut slots, &mut events, &mut world, &mut dispatch, &[]);
    assert_eq!(slots.get(flag), Value::Int(1));

    // Event log was cleared at the end of the prior tick; nothing new raised.
    tick_program(&program, &mut slots, &mut events, &mut world, &mut dispatch, &[]);
    assert_eq!(slots.get(flag), Value::Int(0));
}

/// Scenario: the same `NewObject` call site routes to a unit or a
/// building purely by looking up the resolved type name against the
/// world's building registry, with owner and position passed through
/// unchanged either way.
#[test]
fn new_object_routes_through_the_building_type_registry() {
    let unit_slot = obj_var(0);
    let building_slot = obj_var(1);
    let new_object = func("NewObject");
    let set_tile_pos = func("SetTilePos");

    fn call(new_object: u16, set_tile_pos: u16, type_ref: u32, owner: i32, x: i32, z: i32) -> Expr {
        Expr::Call(Call {
            func_id: new_object,
            args: vec![
                Expr::StringRef(type_ref),
                Expr::IntLit(owner),
                Expr::Call(Call {
                    func_id: set_tile_pos,
                    args: vec![Expr::IntLit(x), Expr::IntLit(z)],
                }),
            ],
        })
    }

    let program = Program {
        blocks: vec![Block {
            condition: Expr::BoolLit(true),
            body: vec![
                Stmt::Assign {
                    slot: unit_slot,
                    value: call(new_object, set_tile_pos, 0, 1, 3, 4),
                },
                Stmt::Assign {
                    slot: building_slot,
                    value: call(new_object, set_tile_pos, 1, 1, 5, 6),
                },
            ],
            else_body: vec![],
        }],
    };

    let mut slots = Slots::default();
    let mut events = EventLog::default();
    let mut world = StubWorld::new()
        .with_unit_types(&["unit_a"])
        .with_building_types(&["building_a"]);
    let mut dispatch = DispatchState::new(1);
    let string_table = vec!["unit_a".to_string(), "building_a".to_string()];

    tick_program(&program, &mut slots, &mut events, &mut world, &mut dispatch, &string_table);

    let unit_eid = slots.get(unit_slot).as_obj();
    let building_eid = slots.get(building_slot).as_obj();

    let unit = world.entity(unit_eid).expect("unit spawned");
    assert!(!unit.is_building);
    assert_eq!(unit.owner, 1);
    assert_eq!(unit.pos, Pos { x: 6.0, z: 8.0 });

    let building = world.entity(building_eid).expect("building spawned");
    assert!(building.is_building);
    assert_eq!(building.owner, 1);
    assert_eq!(building.pos, Pos { x: 10.0, z: 12.0 });
}

/// Scenario: a save taken mid-run, reloaded into a fresh `Mission`
/// restored from it, and then continued, reproduces the exact same
/// final state (variable slots, tick count, and PRNG stream) as an
/// uninterrupted run over the same span — including the draws the
/// continued half makes from the restored RNG.
#[test]
fn save_then_restore_continues_the_same_run_bit_for_bit() {
    let counter = int_var(0);

    fn drive(mission: &mut Mission, world: &mut StubWorld, from: u64, to: u64) {
        for tick in from..=to {
            mission.tick(tick, world);
            let draw = mission.dispatch_state_mut().rng.next_u32() as i32;
            let slot = int_var(0);
            let prev = mission.slots().get(slot).as_int();
            mission.slots_mut().set(slot, Value::Int(prev.wrapping_add(draw)));
        }
    }

    let bytes = always_true_tok();
    const SAVE_AT: u64 = 10;
    const FINAL_TICK: u64 = 25;

    let mut full_run = Mission::load(&bytes, 42, Vec::new()).unwrap();
    let mut full_world = StubWorld::new();
    drive(&mut full_run, &mut full_world, 0, FINAL_TICK);

    let mut first_half = Mission::load(&bytes, 42, Vec::new()).unwrap();
    let mut first_world = StubWorld::new();
    drive(&mut first_half, &mut first_world, 0, SAVE_AT);

    let entity_to_dense = HashMap::new();
    let saved = mission_save::save_tok_state(&first_half, &entity_to_dense);
    let json = mission_save::to_json(&mission_save::MissionSaveState {
        fired_rule_ids: Vec::new(),
        flags: HashMap::new(),
        group_entities: HashMap::new(),
        disabled_rules: Vec::new(),
        repeat_counts: HashMap::new(),
        pending_delayed: Vec::new(),
        tok_state: Some(saved),
    })
    .unwrap();
    let reloaded = mission_save::from_json(&json).unwrap();

    // Different seed on purpose: `restore_tok_state` must fully overwrite
    // the dispatch state rather than leaving the fresh load's RNG in place.
    let mut restored = Mission::load(&bytes, 999, Vec::new()).unwrap();
    let dense_to_entity = HashMap::new();
    mission_save::restore_tok_state(&mut restored, reloaded.tok_state.as_ref().unwrap(), &dense_to_entity);

    let mut restored_world = StubWorld::new();
    drive(&mut restored, &mut restored_world, SAVE_AT + 1, FINAL_TICK);

    assert_eq!(restored.slots().get(counter), full_run.slots().get(counter));
    assert_eq!(restored.dispatch_state().tick_count, full_run.dispatch_state().tick_count);
    assert_eq!(
        restored.dispatch_state().rng.state(),
        full_run.dispatch_state().rng.state()
    );
}

/// Scenario: a camera left mid-spin and tracking an entity at save time
/// comes back mid-spin and tracking the same (dense-index-remapped)
/// entity after restore.
#[test]
fn camera_spin_and_tracked_entity_survive_a_save_restore_round_trip() {
    let bytes = always_true_tok();
    let mut mission = Mission::load(&bytes, 1, Vec::new()).unwrap();

    const TRACKED_EID: i64 = 42;
    let camera = mission.dispatch_state_mut().camera_mut(false);
    camera.track_eid = Some(TRACKED_EID);
    camera.spin.active = true;
    camera.spin.speed = 6;
    camera.spin.dir = 2;

    let mut entity_to_dense = HashMap::new();
    entity_to_dense.insert(TRACKED_EID, 0);
    let saved = mission_save::save_tok_state(&mission, &entity_to_dense);
    let json = serde_json::to_vec(&saved).unwrap();
    let reloaded: mission_save::TokSaveState = serde_json::from_slice(&json).unwrap();

    let mut dense_to_entity = HashMap::new();
    dense_to_entity.insert(0, TRACKED_EID);
    let mut restored = Mission::load(&bytes, 2, Vec::new()).unwrap();
    mission_save::restore_tok_state(&mut restored, &reloaded, &dense_to_entity);

    let camera = restored.dispatch_state().camera(false);
    assert!(camera.spin.active);
    assert_eq!(camera.spin.speed, 6);
    assert_eq!(camera.spin.dir, 2);
    assert_eq!(camera.track_eid, Some(TRACKED_EID));
}
