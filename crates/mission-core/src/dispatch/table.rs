//! Binds the name-keyed function table (`decoder::tables`) to the concrete
//! handler implementations in `dispatch::handlers`, by name rather than by
//! hand-maintained id order - adding a function only means adding one row
//! here and one entry in `NAMED_FUNCTIONS`, never renumbering anything.

use std::sync::OnceLock;

use crate::decoder::tables::{function_table, FUNCTION_TABLE_LEN};

use super::handlers as h;
use super::HandlerFn;

const NAME_BINDINGS: &[(&str, HandlerFn)] = &[
    // 1. Clock / randomness
    ("ModelTick", h::model_tick),
    ("Random", h::random),
    ("Multiplayer", h::multiplayer),
    // 2. Sides
    ("CreateSide", h::create_side),
    ("GetPlayerSide", h::get_player_side),
    ("GetEnemySide", h::get_enemy_side),
    ("GetNeutralSide", h::get_neutral_side),
    ("SideEnemyTo", h::side_enemy_to),
    ("SideFriendTo", h::side_friend_to),
    ("SideNeutralTo", h::side_neutral_to),
    // 3. Points
    ("GetSidePosition", h::get_side_position),
    ("GetEntrancePoint", h::get_entrance_point),
    ("GetNeutralEntrancePoint", h::get_neutral_entrance_point),
    ("GetScriptPoint", h::get_script_point),
    ("GetUnusedBasePoint", h::get_unused_base_point),
    // 4. Spawning
    ("NewObject", h::new_object),
    ("NewObjectInAPC", h::new_object_in_apc),
    ("NewObjectOffsetOrientation", h::new_object_offset_orientation),
    // 5. Object queries
    ("ObjectValid", h::object_valid),
    ("ObjectDestroyed", h::object_destroyed),
    ("ObjectNearToSide", h::object_near_to_side),
    ("ObjectNearToObject", h::object_near_to_object),
    ("ObjectGetHealth", h::object_get_health),
    ("ObjectMaxHealth", h::object_max_health),
    // 6. Object mutation
    ("ObjectSetHealth", h::object_set_health),
    ("ObjectChangeSide", h::object_change_side),
    ("ObjectChange", h::object_change),
    ("ObjectRemove", h::object_remove),
    ("ObjectDeploy", h::object_deploy),
    ("ObjectUndeploy", h::object_undeploy),
    ("ObjectSell", h::object_sell),
    ("ObjectInfect", h::object_infect),
    ("ObjectDetonate", h::object_detonate),
    // 7. Side queries
    ("SideUnitCount", h::side_unit_count),
    ("SideBuildingCount", h::side_building_count),
    ("SideAIDone", h::side_ai_done),
    ("SideNearToSide", h::side_near_to_side),
    ("SideNearToPoint", h::side_near_to_point),
    // 8. AI orders
    ("SideAIAggressive", h::side_ai_inert),
    ("SideAIMove", h::side_ai_move),
    ("SideAIStop", h::side_ai_stop),
    ("SideAIAttackObject", h::side_ai_attack_object),
    ("SideAIGuardObject", h::side_ai_inert),
    ("SideAIExitMap", h::side_ai_inert),
    ("SideAIEncounterAttack", h::side_ai_inert),
    ("SideAIBehaviourAggressive", h::side_ai_inert),
    ("SideAIBehaviourRetreat", h::side_ai_inert),
    ("SideAIBehaviourNormal", h::side_ai_inert),
    ("SideAIBehaviourDefensive", h::side_ai_inert),
    ("SideAIBehaviourShuffle", h::side_ai_inert),
    ("SideAIHeadlessChicken", h::side_ai_inert),
    ("SideAIEnterBuilding", h::side_ai_inert),
    ("SideAIEncounterIgnore", h::side_ai_inert),
    ("SideAIControl", h::side_ai_inert),
    // 9. Messages / dialog
    ("Message", h::message),
    ("GiftingMessage", h::gifting_message),
    ("TimerMessage", h::timer_message),
    // 10. Credits
    ("AddSideCash", h::add_side_cash),
    ("SetSideCash", h::set_side_cash),
    ("GetSideCash", h::get_side_cash),
    ("GetSideSpice", h::get_side_spice),
    // 11. Camera (main)
    ("CameraLookAtPoint", h::camera_look_at_point),
    ("CameraPanToPoint", h::camera_pan_to_point),
    ("CameraScrollToPoint", h::camera_scroll_to_point),
    ("CameraTrackObject", h::camera_track_object),
    ("CameraStartRotate", h::camera_start_rotate),
    ("CameraStopRotate", h::camera_stop_rotate),
    ("CameraIsSpinning", h::camera_is_spinning),
    ("CameraStore", h::camera_store),
    ("CameraRestore", h::camera_restore),
    // 11. Camera (picture-in-picture)
    ("CameraPIPLookAtPoint", h::camera_pip_look_at_point),
    ("CameraPIPPanToPoint", h::camera_pip_pan_to_point),
    ("CameraPIPScrollToPoint", h::camera_pip_scroll_to_point),
    ("CameraPIPTrackObject", h::camera_pip_track_object),
    ("CameraPIPStartRotate", h::camera_pip_start_rotate),
    ("CameraPIPStopRotate", h::camera_pip_stop_rotate),
    ("CameraPIPIsSpinning", h::camera_pip_is_spinning),
    ("CameraPIPStore", h::camera_pip_store),
    ("CameraPIPRestore", h::camera_pip_restore),
    // 12. Fog / radar
    ("RemoveShroud", h::remove_shroud),
    ("ReplaceShroud", h::replace_shroud),
    ("RemoveMapShroud", h::remove_map_shroud),
    ("RadarEnabled", h::radar_enabled),
    ("RadarAlert", h::radar_alert),
    // 13. Victory / defeat
    ("MissionOutcome", h::mission_outcome),
    ("EndGameWin", h::end_game_win),
    ("EndGameLose", h::end_game_lose),
    ("NormalConditionLose", h::normal_condition_lose),
    // 14. Events
    ("EventObjectDestroyed", h::event_object_destroyed),
    ("EventObjectDelivered", h::event_object_delivered),
    ("EventObjectConstructed", h::event_object_constructed),
    ("EventObjectTypeConstructed", h::event_object_type_constructed),
    ("EventSideAttacksSide", h::event_side_attacks_side),
    ("EventObjectAttacksSide", h::event_object_attacks_side),
    // 15. Superweapons / worms / air strikes
    ("ForceWormStrike", h::force_worm_strike),
    ("SideNuke", h::side_nuke),
    ("FireSpecialWeapon", h::fire_special_weapon),
    ("AirStrike", h::air_strike),
    ("AirStrikeDone", h::air_strike_done),
    // 16. Crates
    ("NewCrateUnit", h::new_crate_unit),
    ("NewCrateBomb", h::new_crate_bomb),
    ("NewCrateStealth", h::new_crate_stealth),
    ("NewCrateCash", h::new_crate_cash),
    ("NewCrateShroud", h::new_crate_shroud),
    // 17. Misc
    ("SetTilePos", h::set_tile_pos),
    ("Neg", h::neg),
    ("SetValue", h::set_value),
    ("SetThreatLevel", h::set_threat_level),
    ("DisableUI", h::disable_ui),
    ("EnableUI", h::enable_ui),
    ("FreezeGame", h::freeze_game),
    ("UnFreezeGame", h::unfreeze_game),
];

fn build_handler_table() -> Vec<Option<HandlerFn>> {
    let mut table = vec![None; FUNCTION_TABLE_LEN];
    for spec in function_table() {
        if let Some((_, handler)) = NAME_BINDINGS.iter().find(|(name, _)| *name == spec.name) {
            table[spec.id as usize] = Some(*handler);
        }
    }
    table
}

static HANDLER_TABLE: OnceLock<Vec<Option<HandlerFn>>> = OnceLock::new();

pub fn handler_for(func_id: u16) -> Option<HandlerFn> {
    HANDLER_TABLE
        .get_or_init(build_handler_table)
        .get(func_id as usize)
        .copied()
        .flatten()
}

/// The positional argument index that is bound as an out-var lvalue
/// rather than evaluated as a plain value, keyed by function name
/// (§4.E group 14, group 17). Every other call's arguments are plain
/// value expressions.
pub fn out_var_arg_for(func_id: u16) -> Option<u8> {
    let name = crate::decoder::tables::function_spec(func_id)?.name;
    match name {
        "EventObjectDelivered" => Some(1),
        "EventObjectConstructed" => Some(1),
        "EventObjectTypeConstructed" => Some(2),
        "SetValue" => Some(0),
        _ => None,
    }
}
