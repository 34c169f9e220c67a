//! Concrete implementations of every named host function in
//! `decoder::tables::NAMED_FUNCTIONS`. Grouped and commented by dispatch
//! group to match the table's own ordering; reserved ids have no entry
//! here at all and fall through to the inert default in `dispatch::dispatch`.

use crate::dispatch::{DispatchCtx, EvalArg};
use crate::events::Fact;
use crate::sides::Relation;
use crate::value::Value;
use crate::world::{NotificationCategory, Pos, Side, NO_ENTITY};

use super::state::{CameraSnapshot, CrateKind, CrateRecord};

const OBJECT_NEAR_SIDE_THRESHOLD: f32 = 30.0;
const OBJECT_NEAR_OBJECT_THRESHOLD: f32 = 20.0;
const SIDE_NEAR_THRESHOLD: f32 = 40.0;
const APC_JITTER_RADIUS: f32 = 2.0;

fn arg_int(args: &[EvalArg], i: usize) -> i32 {
    args.get(i).map(|a| a.value().as_int()).unwrap_or(0)
}

fn arg_side(args: &[EvalArg], i: usize) -> Side {
    arg_int(args, i) as Side
}

fn arg_pos(args: &[EvalArg], i: usize) -> Pos {
    args.get(i).map(|a| a.value().as_pos()).unwrap_or(Pos::ZERO)
}

fn arg_obj(args: &[EvalArg], i: usize) -> crate::world::EntityId {
    args.get(i)
        .map(|a| a.value().as_obj())
        .unwrap_or(NO_ENTITY)
}

fn arg_bool(args: &[EvalArg], i: usize) -> bool {
    arg_int(args, i) != 0
}

fn write_out_var(ctx: &mut DispatchCtx, args: &[EvalArg], index: usize, value: Value) {
    if let Some(EvalArg::OutVar(slot)) = args.get(index) {
        ctx.slots.set(*slot, value);
    }
}

fn centroid(positions: &[Pos]) -> Option<Pos> {
    if positions.is_empty() {
        return None;
    }
    let (sum_x, sum_z) = positions
        .iter()
        .fold((0.0, 0.0), |(sx, sz), p| (sx + p.x, sz + p.z));
    let n = positions.len() as f32;
    Some(Pos {
        x: sum_x / n,
        z: sum_z / n,
    })
}

// --- 1. Clock / randomness --------------------------------------------------

pub fn model_tick(ctx: &mut DispatchCtx, _args: &[EvalArg]) -> Value {
    Value::Int(ctx.state.tick_count as i32)
}

pub fn random(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let max = arg_int(args, 0);
    // Random(n<=0) is defined to return 0 rather than delegate to an
    // inverted range (§9 resolved Open Question).
    if max <= 0 {
        return Value::Int(0);
    }
    Value::Int(ctx.state.rng.int(0, max - 1))
}

pub fn multiplayer(_ctx: &mut DispatchCtx, _args: &[EvalArg]) -> Value {
    Value::Int(0)
}

// --- 2. Sides ----------------------------------------------------------------

pub fn create_side(ctx: &mut DispatchCtx, _args: &[EvalArg]) -> Value {
    Value::Int(ctx.state.sides.allocate_side() as i32)
}

pub fn get_player_side(_ctx: &mut DispatchCtx, _args: &[EvalArg]) -> Value {
    Value::Int(crate::world::SIDE_PLAYER as i32)
}

pub fn get_enemy_side(_ctx: &mut DispatchCtx, _args: &[EvalArg]) -> Value {
    Value::Int(crate::world::SIDE_ENEMY as i32)
}

pub fn get_neutral_side(_ctx: &mut DispatchCtx, _args: &[EvalArg]) -> Value {
    Value::Int(crate::world::SIDE_NEUTRAL as i32)
}

pub fn side_enemy_to(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    ctx.state
        .sides
        .set_relation_mutual(arg_side(args, 0), arg_side(args, 1), Relation::Enemy);
    Value::Int(1)
}

pub fn side_friend_to(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    ctx.state
        .sides
        .set_relation_mutual(arg_side(args, 0), arg_side(args, 1), Relation::Friend);
    Value::Int(1)
}

pub fn side_neutral_to(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    ctx.state
        .sides
        .set_relation_mutual(arg_side(args, 0), arg_side(args, 1), Relation::Neutral);
    Value::Int(1)
}

// --- 3. Points ---------------------------------------------------------------

pub fn get_side_position(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let side = arg_side(args, 0);
    let mut positions: Vec<Pos> = ctx
        .world
        .live_units_of(side)
        .into_iter()
        .chain(ctx.world.live_buildings_of(side))
        .filter_map(|eid| ctx.world.position(eid))
        .collect();
    if let Some(pos) = centroid(&positions) {
        return Value::Pos(pos);
    }
    positions.clear();
    let fallback = ctx
        .state
        .side_base_positions
        .get(&side)
        .copied()
        .unwrap_or(Pos::ZERO);
    Value::Pos(fallback)
}

pub fn get_entrance_point(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let marker = arg_int(args, 0);
    entrance_point_for(ctx, marker)
}

pub fn get_neutral_entrance_point(ctx: &mut DispatchCtx, _args: &[EvalArg]) -> Value {
    entrance_point_for(ctx, 99)
}

fn entrance_point_for(ctx: &mut DispatchCtx, marker: i32) -> Value {
    let entrance = ctx
        .world
        .map_metadata()
        .entrances
        .iter()
        .find(|e| e.marker == marker)
        .copied();
    let pos = entrance
        .map(|e| Pos {
            x: e.tile_x as f32 * crate::world::TILE_SIZE,
            z: e.tile_z as f32 * crate::world::TILE_SIZE,
        })
        .unwrap_or(Pos::ZERO);
    Value::Pos(pos)
}

pub fn get_script_point(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let n = arg_int(args, 0);
    let pos = ctx
        .world
        .map_metadata()
        .script_points
        .get((n - 1).max(0) as usize)
        .copied()
        .unwrap_or(Pos::ZERO);
    Value::Pos(pos)
}

pub fn get_unused_base_point(ctx: &mut DispatchCtx, _args: &[EvalArg]) -> Value {
    let count = ctx.world.map_metadata().base_spawn_points.len();
    for index in 0..count {
        if !ctx.state.used_base_points.contains(&index) {
            ctx.state.used_base_points.insert(index);
            let pos = ctx.world.map_metadata().base_spawn_points[index];
            return Value::Pos(pos);
        }
    }
    Value::Pos(Pos::ZERO)
}

// --- 4. Spawning ---------------------------------------------------------------

pub fn new_object(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let type_name = ctx.string_at(arg_int(args, 0)).to_string();
    let owner = arg_side(args, 1);
    let pos = arg_pos(args, 2);
    if ctx
        .world
        .building_type_names()
        .iter()
        .any(|t| *t == type_name)
    {
        Value::Obj(ctx.world.spawn_building(&type_name, owner, pos))
    } else {
        Value::Obj(ctx.world.spawn_unit(&type_name, owner, pos))
    }
}

pub fn new_object_in_apc(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let type_name = ctx.string_at(arg_int(args, 0)).to_string();
    let owner = arg_side(args, 1);
    let center = arg_pos(args, 2);
    let pos = Pos {
        x: center.x + ctx.state.rng.float(-APC_JITTER_RADIUS, APC_JITTER_RADIUS),
        z: center.z + ctx.state.rng.float(-APC_JITTER_RADIUS, APC_JITTER_RADIUS),
    };
    Value::Obj(ctx.world.spawn_unit(&type_name, owner, pos))
}

pub fn new_object_offset_orientation(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let type_name = ctx.string_at(arg_int(args, 0)).to_string();
    let owner = arg_side(args, 1);
    let pos = arg_pos(args, 2);
    // Orientation (args[3]) has no seam on `WorldView`; the host is free
    // to derive a default facing from the spawn point.
    Value::Obj(ctx.world.spawn_unit(&type_name, owner, pos))
}

// --- 5. Object queries ---------------------------------------------------------

pub fn object_valid(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    Value::Int((ctx.world.health(arg_obj(args, 0)) > 0) as i32)
}

pub fn object_destroyed(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    Value::Int((ctx.world.health(arg_obj(args, 0)) <= 0) as i32)
}

pub fn object_near_to_side(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let eid = arg_obj(args, 0);
    let side = arg_side(args, 1);
    let origin = ctx.world.position(eid).unwrap_or(Pos::ZERO);
    let near = ctx
        .world
        .live_units_of(side)
        .into_iter()
        .chain(ctx.world.live_buildings_of(side))
        .any(|other| {
            ctx.world
                .position(other)
                .map(|p| p.distance(origin) <= OBJECT_NEAR_SIDE_THRESHOLD)
                .unwrap_or(false)
        });
    Value::Int(near as i32)
}

pub fn object_near_to_object(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let a = ctx.world.position(arg_obj(args, 0)).unwrap_or(Pos::ZERO);
    let b = ctx.world.position(arg_obj(args, 1)).unwrap_or(Pos::ZERO);
    Value::Int((a.distance(b) <= OBJECT_NEAR_OBJECT_THRESHOLD) as i32)
}

pub fn object_get_health(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    Value::Int(ctx.world.health(arg_obj(args, 0)))
}

pub fn object_max_health(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    Value::Int(ctx.world.max_health(arg_obj(args, 0)))
}

// --- 6. Object mutation ----------------------------------------------------------

pub fn object_set_health(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    ctx.world.set_health(arg_obj(args, 0), arg_int(args, 1));
    Value::Int(1)
}

pub fn object_change_side(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    ctx.world.set_owner(arg_obj(args, 0), arg_side(args, 1));
    Value::Int(1)
}

pub fn object_change(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let eid = arg_obj(args, 0);
    let type_name = ctx.string_at(arg_int(args, 1)).to_string();
    let owner = arg_side(args, 2);
    ctx.world.morph_object(eid, &type_name, owner);
    Value::Int(1)
}

pub fn object_remove(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let eid = arg_obj(args, 0);
    ctx.world.kill_entity(eid);
    ctx.events.push(Fact::Destroyed { eid });
    Value::Int(1)
}

pub fn object_deploy(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    ctx.world.deploy(arg_obj(args, 0));
    Value::Int(1)
}

pub fn object_undeploy(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    ctx.world.undeploy(arg_obj(args, 0));
    Value::Int(1)
}

pub fn object_sell(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    ctx.world.sell_building(arg_obj(args, 0));
    Value::Int(1)
}

pub fn object_infect(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    ctx.world.set_owner(arg_obj(args, 0), arg_side(args, 1));
    Value::Int(1)
}

pub fn object_detonate(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let eid = arg_obj(args, 0);
    ctx.world.kill_entity(eid);
    ctx.world.play_sfx("explosion");
    ctx.events.push(Fact::Destroyed { eid });
    Value::Int(1)
}

// --- 7. Side queries ---------------------------------------------------------------

pub fn side_unit_count(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    Value::Int(ctx.world.live_units_of(arg_side(args, 0)).len() as i32)
}

pub fn side_building_count(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    Value::Int(ctx.world.live_buildings_of(arg_side(args, 0)).len() as i32)
}

pub fn side_ai_done(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let side = arg_side(args, 0);
    let done = ctx
        .world
        .live_units_of(side)
        .into_iter()
        .all(|eid| !ctx.world.has_active_move(eid));
    Value::Int(done as i32)
}

pub fn side_near_to_side(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let a = arg_side(args, 0);
    let b = arg_side(args, 1);
    let b_positions: Vec<Pos> = ctx
        .world
        .live_units_of(b)
        .into_iter()
        .filter_map(|eid| ctx.world.position(eid))
        .collect();
    let near = ctx
        .world
        .live_units_of(a)
        .into_iter()
        .filter_map(|eid| ctx.world.position(eid))
        .any(|p| {
            b_positions
                .iter()
                .any(|q| p.distance(*q) <= SIDE_NEAR_THRESHOLD)
        });
    Value::Int(near as i32)
}

pub fn side_near_to_point(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let side = arg_side(args, 0);
    let point = arg_pos(args, 1);
    let near = ctx
        .world
        .live_units_of(side)
        .into_iter()
        .filter_map(|eid| ctx.world.position(eid))
        .any(|p| p.distance(point) <= SIDE_NEAR_THRESHOLD);
    Value::Int(near as i32)
}

// --- 8. AI orders ----------------------------------------------------------------

/// Behaviour-modifier calls (stance, posture, encounter rules) are
/// recorded by the original compiler's id space but have no observable
/// effect on the host surface this crate exposes (§9 resolved Open
/// Question); they are accepted and answered successfully, not rejected.
pub fn side_ai_inert(_ctx: &mut DispatchCtx, _args: &[EvalArg]) -> Value {
    Value::Int(1)
}

pub fn side_ai_move(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let side = arg_side(args, 0);
    let pos = arg_pos(args, 1);
    for eid in ctx.world.live_units_of(side) {
        ctx.world.issue_move(eid, pos);
    }
    Value::Int(1)
}

pub fn side_ai_stop(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let side = arg_side(args, 0);
    for eid in ctx.world.live_units_of(side) {
        ctx.world.clear_move(eid);
    }
    Value::Int(1)
}

pub fn side_ai_attack_object(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let side = arg_side(args, 0);
    let target = arg_obj(args, 1);
    let units = ctx.world.live_units_of(side);
    ctx.world.set_attack_move(&units);
    if let Some(owner) = ctx.world.owner(target) {
        ctx.events.push(Fact::SideAttacksSide { a: side, b: owner });
    }
    ctx.events.push(Fact::ObjectAttacksSide { eid: target, side });
    Value::Int(1)
}

// --- 9. Messages / dialog ----------------------------------------------------------

pub fn message(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let text = ctx.string_at(arg_int(args, 0)).to_string();
    ctx.world.push_notification(&text, NotificationCategory::Message);
    Value::Int(1)
}

pub fn gifting_message(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let text = ctx.string_at(arg_int(args, 0)).to_string();
    ctx.world.push_notification(&text, NotificationCategory::Gifting);
    Value::Int(1)
}

pub fn timer_message(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let text = ctx.string_at(arg_int(args, 0)).to_string();
    ctx.world.push_notification(&text, NotificationCategory::Timer);
    Value::Int(1)
}

// --- 10. Credits ----------------------------------------------------------------------

pub fn add_side_cash(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let side = arg_side(args, 0);
    let amount = ctx.world.side_cash(side) + arg_int(args, 1);
    ctx.world.set_side_cash(side, amount);
    Value::Int(amount)
}

pub fn set_side_cash(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    ctx.world.set_side_cash(arg_side(args, 0), arg_int(args, 1));
    Value::Int(1)
}

pub fn get_side_cash(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    Value::Int(ctx.world.side_cash(arg_side(args, 0)))
}

pub fn get_side_spice(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    // Spice and tiberium-equivalent resources fold into the same host
    // cash ledger; there is no separate spice account on `WorldView`.
    Value::Int(ctx.world.side_cash(arg_side(args, 0)))
}

// --- 11. Camera (main + picture-in-picture) --------------------------------------

fn camera_look_at(ctx: &mut DispatchCtx, args: &[EvalArg], pip: bool) -> Value {
    let pos = arg_pos(args, 0);
    ctx.state.camera_mut(pip).pos = pos;
    ctx.state.camera_mut(pip).track_eid = None;
    if !pip {
        ctx.world.pan_camera_to(pos);
    }
    Value::Int(1)
}

fn camera_track(ctx: &mut DispatchCtx, args: &[EvalArg], pip: bool) -> Value {
    let eid = arg_obj(args, 0);
    ctx.state.camera_mut(pip).track_eid = Some(eid);
    if let Some(pos) = ctx.world.position(eid) {
        ctx.state.camera_mut(pip).pos = pos;
        if !pip {
            ctx.world.pan_camera_to(pos);
        }
    }
    Value::Int(1)
}

fn camera_start_rotate_impl(ctx: &mut DispatchCtx, args: &[EvalArg], pip: bool) -> Value {
    let speed = arg_int(args, 0);
    let dir = arg_int(args, 1);
    let camera = ctx.state.camera_mut(pip);
    camera.spin.active = true;
    camera.spin.speed = speed;
    camera.spin.dir = dir;
    Value::Int(1)
}

fn camera_stop_rotate_impl(ctx: &mut DispatchCtx, _args: &[EvalArg], pip: bool) -> Value {
    ctx.state.camera_mut(pip).spin.active = false;
    Value::Int(1)
}

fn camera_is_spinning_impl(ctx: &mut DispatchCtx, _args: &[EvalArg], pip: bool) -> Value {
    Value::Int(ctx.state.camera(pip).spin.active as i32)
}

fn camera_store_impl(ctx: &mut DispatchCtx, _args: &[EvalArg], pip: bool) -> Value {
    let camera = ctx.state.camera(pip);
    let snapshot = CameraSnapshot {
        x: camera.pos.x,
        z: camera.pos.z,
        zoom: camera.zoom,
        rotation: camera.spin.dir as f32,
    };
    ctx.state.camera_mut(pip).stored = Some(snapshot);
    Value::Int(1)
}

fn camera_restore_impl(ctx: &mut DispatchCtx, _args: &[EvalArg], pip: bool) -> Value {
    if let Some(snapshot) = ctx.state.camera(pip).stored {
        let pos = Pos {
            x: snapshot.x,
            z: snapshot.z,
        };
        let camera = ctx.state.camera_mut(pip);
        camera.pos = pos;
        camera.zoom = snapshot.zoom;
        if !pip {
            ctx.world.pan_camera_to(pos);
        }
    }
    Value::Int(1)
}

pub fn camera_look_at_point(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    camera_look_at(ctx, args, false)
}
pub fn camera_pan_to_point(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    camera_look_at(ctx, args, false)
}
pub fn camera_scroll_to_point(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    camera_look_at(ctx, args, false)
}
pub fn camera_track_object(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    camera_track(ctx, args, false)
}
pub fn camera_start_rotate(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    camera_start_rotate_impl(ctx, args, false)
}
pub fn camera_stop_rotate(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    camera_stop_rotate_impl(ctx, args, false)
}
pub fn camera_is_spinning(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    camera_is_spinning_impl(ctx, args, false)
}
pub fn camera_store(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    camera_store_impl(ctx, args, false)
}
pub fn camera_restore(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    camera_restore_impl(ctx, args, false)
}

pub fn camera_pip_look_at_point(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    camera_look_at(ctx, args, true)
}
pub fn camera_pip_pan_to_point(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    camera_look_at(ctx, args, true)
}
pub fn camera_pip_scroll_to_point(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    camera_look_at(ctx, args, true)
}
pub fn camera_pip_track_object(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    camera_track(ctx, args, true)
}
pub fn camera_pip_start_rotate(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    camera_start_rotate_impl(ctx, args, true)
}
pub fn camera_pip_stop_rotate(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    camera_stop_rotate_impl(ctx, args, true)
}
pub fn camera_pip_is_spinning(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    camera_is_spinning_impl(ctx, args, true)
}
pub fn camera_pip_store(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    camera_store_impl(ctx, args, true)
}
pub fn camera_pip_restore(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    camera_restore_impl(ctx, args, true)
}

// --- 12. Fog / radar ---------------------------------------------------------------

pub fn remove_shroud(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    ctx.world.reveal_area(arg_pos(args, 0), arg_int(args, 1) as f32);
    Value::Int(1)
}

pub fn replace_shroud(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    ctx.world.cover_area(arg_pos(args, 0), arg_int(args, 1) as f32);
    Value::Int(1)
}

pub fn remove_map_shroud(ctx: &mut DispatchCtx, _args: &[EvalArg]) -> Value {
    ctx.world.reveal_all();
    Value::Int(1)
}

pub fn radar_enabled(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let enabled = arg_bool(args, 0);
    ctx.state.radar_force_enabled = enabled;
    ctx.world.set_radar_force_enabled(enabled);
    Value::Int(1)
}

pub fn radar_alert(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    ctx.world.radar_pulse(arg_pos(args, 0));
    Value::Int(1)
}

// --- 13. Victory / defeat ------------------------------------------------------------

pub fn mission_outcome(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let victory = arg_bool(args, 0);
    ctx.state.mission_outcome = Some(victory);
    ctx.world.set_mission_outcome(victory);
    Value::Int(1)
}

pub fn end_game_win(ctx: &mut DispatchCtx, _args: &[EvalArg]) -> Value {
    ctx.state.mission_outcome = Some(true);
    ctx.world.set_mission_outcome(true);
    Value::Int(1)
}

pub fn end_game_lose(ctx: &mut DispatchCtx, _args: &[EvalArg]) -> Value {
    ctx.state.mission_outcome = Some(false);
    ctx.world.set_mission_outcome(false);
    Value::Int(1)
}

pub fn normal_condition_lose(ctx: &mut DispatchCtx, _args: &[EvalArg]) -> Value {
    let side = crate::world::SIDE_PLAYER;
    let wiped =
        ctx.world.live_units_of(side).is_empty() && ctx.world.live_buildings_of(side).is_empty();
    Value::Int(wiped as i32)
}

// --- 14. Events (consuming + non-consuming queries, §3.4) ------------------------------

pub fn event_object_destroyed(ctx: &mut DispatchCtx, _args: &[EvalArg]) -> Value {
    let taken = ctx.events.take_first(|f| matches!(f, Fact::Destroyed { .. }));
    Value::Int(taken.is_some() as i32)
}

pub fn event_object_delivered(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let side = arg_side(args, 0);
    let fact = ctx
        .events
        .take_first(|f| matches!(f, Fact::DeliveredSide { side: s, .. } if *s == side));
    match fact {
        Some(Fact::DeliveredSide { eid, .. }) => {
            write_out_var(ctx, args, 1, Value::Obj(eid));
            Value::Int(1)
        }
        _ => Value::Int(0),
    }
}

pub fn event_object_constructed(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let side = arg_side(args, 0);
    let fact = ctx
        .events
        .take_first(|f| matches!(f, Fact::Constructed { side: s, .. } if *s == side));
    match fact {
        Some(Fact::Constructed { eid, .. }) => {
            write_out_var(ctx, args, 1, Value::Obj(eid));
            Value::Int(1)
        }
        _ => Value::Int(0),
    }
}

pub fn event_object_type_constructed(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let side = arg_side(args, 0);
    let type_name = ctx.string_at(arg_int(args, 1)).to_string();
    let fact = ctx.events.take_first(|f| {
        matches!(f, Fact::TypeConstructed { side: s, type_name: t, .. } if *s == side && *t == type_name)
    });
    match fact {
        Some(Fact::TypeConstructed { eid, .. }) => {
            write_out_var(ctx, args, 2, Value::Obj(eid));
            Value::Int(1)
        }
        _ => Value::Int(0),
    }
}

pub fn event_side_attacks_side(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let a = arg_side(args, 0);
    let b = arg_side(args, 1);
    Value::Int(
        ctx.events
            .any(|f| matches!(f, Fact::SideAttacksSide { a: x, b: y } if *x == a && *y == b)) as i32,
    )
}

pub fn event_object_attacks_side(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let eid = arg_obj(args, 0);
    let side = arg_side(args, 1);
    Value::Int(
        ctx.events.any(
            |f| matches!(f, Fact::ObjectAttacksSide { eid: e, side: s } if *e == eid && *s == side),
        ) as i32,
    )
}

// --- 15. Superweapons / worms / air strikes --------------------------------------------

pub fn force_worm_strike(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    ctx.world.radar_pulse(arg_pos(args, 0));
    Value::Int(1)
}

pub fn side_nuke(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let pos = arg_pos(args, 1);
    ctx.world.play_sfx("nuke");
    ctx.world.radar_pulse(pos);
    Value::Int(1)
}

pub fn fire_special_weapon(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let name = ctx.string_at(arg_int(args, 0)).to_string();
    let pos = arg_pos(args, 1);
    ctx.world.play_sfx(&name);
    ctx.world.radar_pulse(pos);
    Value::Int(1)
}

const AIR_STRIKE_WAVE_SIZE: i32 = 2;

pub fn air_strike(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let strike_id = arg_int(args, 0);
    let type_name = ctx.string_at(arg_int(args, 1)).to_string();
    let side = arg_side(args, 2);
    let target = arg_pos(args, 3);
    let origin = ctx
        .world
        .map_metadata()
        .entrances
        .first()
        .map(|e| Pos {
            x: e.tile_x as f32 * crate::world::TILE_SIZE,
            z: e.tile_z as f32 * crate::world::TILE_SIZE,
        })
        .unwrap_or(target);
    let mut unit_ids = Vec::new();
    for _ in 0..AIR_STRIKE_WAVE_SIZE {
        unit_ids.push(ctx.world.spawn_unit(&type_name, side, origin));
    }
    ctx.world.set_attack_move(&unit_ids);
    for &eid in &unit_ids {
        ctx.world.issue_move(eid, target);
    }
    ctx.state.air_strikes.push(super::state::AirStrikeRecord {
        strike_id,
        unit_ids,
        target,
    });
    Value::Int(strike_id)
}

pub fn air_strike_done(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let strike_id = arg_int(args, 0);
    let Some(index) = ctx
        .state
        .air_strikes
        .iter()
        .position(|r| r.strike_id == strike_id)
    else {
        return Value::Int(1);
    };
    let finished = ctx.state.air_strikes[index]
        .unit_ids
        .iter()
        .all(|&eid| !ctx.world.has_active_move(eid));
    if finished {
        ctx.state.air_strikes.remove(index);
        Value::Int(1)
    } else {
        Value::Int(0)
    }
}

// --- 16. Crates --------------------------------------------------------------------------

fn spawn_crate(ctx: &mut DispatchCtx, args: &[EvalArg], kind: CrateKind) -> Value {
    let pos = arg_pos(args, 0);
    let crate_id = ctx.state.next_crate_id;
    ctx.state.next_crate_id += 1;
    ctx.state.crates.push(CrateRecord { crate_id, pos, kind });
    Value::Int(crate_id)
}

pub fn new_crate_unit(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    spawn_crate(ctx, args, CrateKind::Unit)
}
pub fn new_crate_bomb(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    spawn_crate(ctx, args, CrateKind::Bomb)
}
pub fn new_crate_stealth(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    spawn_crate(ctx, args, CrateKind::Stealth)
}
pub fn new_crate_cash(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    spawn_crate(ctx, args, CrateKind::Cash)
}
pub fn new_crate_shroud(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    spawn_crate(ctx, args, CrateKind::Shroud)
}

// --- 17. Misc ----------------------------------------------------------------------------

pub fn set_tile_pos(_ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let tile_x = arg_int(args, 0);
    let tile_z = arg_int(args, 1);
    Value::Pos(Pos {
        x: tile_x as f32 * crate::world::TILE_SIZE,
        z: tile_z as f32 * crate::world::TILE_SIZE,
    })
}

pub fn neg(_ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    Value::Int(-arg_int(args, 0))
}

pub fn set_value(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let value = args.get(1).map(|a| a.value()).unwrap_or(Value::Int(0));
    write_out_var(ctx, args, 0, value);
    Value::Int(1)
}

pub fn set_threat_level(ctx: &mut DispatchCtx, args: &[EvalArg]) -> Value {
    let type_name = ctx.string_at(arg_int(args, 0)).to_string();
    let level = arg_int(args, 1);
    ctx.state.threat_levels.insert(type_name, level);
    Value::Int(1)
}

pub fn disable_ui(ctx: &mut DispatchCtx, _args: &[EvalArg]) -> Value {
    ctx.state.ui_enabled = false;
    ctx.state.game_frozen = true;
    Value::Int(1)
}

pub fn enable_ui(ctx: &mut DispatchCtx, _args: &[EvalArg]) -> Value {
    ctx.state.ui_enabled = true;
    ctx.state.game_frozen = false;
    Value::Int(1)
}

pub fn freeze_game(ctx: &mut DispatchCtx, _args: &[EvalArg]) -> Value {
    ctx.state.game_frozen = true;
    ctx.state.ui_enabled = false;
    Value::Int(1)
}

pub fn unfreeze_game(ctx: &mut DispatchCtx, _args: &[EvalArg]) -> Value {
    ctx.state.game_frozen = false;
    ctx.state.ui_enabled = true;
    Value::Int(1)
}
