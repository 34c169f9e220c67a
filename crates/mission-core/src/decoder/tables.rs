//! The host function/keyword dispatch tables (§4.B, §6.2), exposed as
//! plain data rather than hard-coded match arms, per the design note that
//! the function and building-type registries should be data the dispatcher
//! walks rather than logic it branches on.
//!
//! Ids `0..162` are host function calls; ids `162..181` are syntax
//! keywords. `KEYWORD_THRESHOLD` is the authoritative boundary between the
//! two ranges. Every id in `0..162` carries exactly one symbolic name
//! (§4.B "Keyword / function id tables"): ids the dispatch groups of §4.E
//! don't name are filled with a placeholder `UnusedNN` name so the table
//! stays total, matching a fixed-size jump table rather than a sparse map.

use std::sync::OnceLock;

pub const KEYWORD_THRESHOLD: u16 = 162;
pub const FUNCTION_TABLE_LEN: usize = 162;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuncSpec {
    pub id: u16,
    pub name: &'static str,
}

/// The 162-entry function-id table, in §4.E dispatch-group order; ids are
/// assigned by position. Names past the real catalog are `UnusedNN`
/// placeholders reserved by the original compiler's id space but never
/// emitted by any known mission; calling one is legal and a no-op (§7.2).
const NAMED_FUNCTIONS: &[&str] = &[
    // 1. Clock / randomness
    "ModelTick",
    "Random",
    "Multiplayer",
    // 2. Sides
    "CreateSide",
    "GetPlayerSide",
    "GetEnemySide",
    "GetNeutralSide",
    "SideEnemyTo",
    "SideFriendTo",
    "SideNeutralTo",
    // 3. Points
    "GetSidePosition",
    "GetEntrancePoint",
    "GetNeutralEntrancePoint",
    "GetScriptPoint",
    "GetUnusedBasePoint",
    // 4. Spawning
    "NewObject",
    "NewObjectInAPC",
    "NewObjectOffsetOrientation",
    // 5. Object queries
    "ObjectValid",
    "ObjectDestroyed",
    "ObjectNearToSide",
    "ObjectNearToObject",
    "ObjectGetHealth",
    "ObjectMaxHealth",
    // 6. Object mutation
    "ObjectSetHealth",
    "ObjectChangeSide",
    "ObjectChange",
    "ObjectRemove",
    "ObjectDeploy",
    "ObjectUndeploy",
    "ObjectSell",
    "ObjectInfect",
    "ObjectDetonate",
    // 7. Side queries
    "SideUnitCount",
    "SideBuildingCount",
    "SideAIDone",
    "SideNearToSide",
    "SideNearToPoint",
    // 8. AI orders
    "SideAIAggressive",
    "SideAIMove",
    "SideAIStop",
    "SideAIAttackObject",
    "SideAIGuardObject",
    "SideAIExitMap",
    "SideAIEncounterAttack",
    "SideAIBehaviourAggressive",
    "SideAIBehaviourRetreat",
    "SideAIBehaviourNormal",
    "SideAIBehaviourDefensive",
    "SideAIBehaviourShuffle",
    "SideAIHeadlessChicken",
    "SideAIEnterBuilding",
    "SideAIEncounterIgnore",
    "SideAIControl",
    // 9. Messages / dialog
    "Message",
    "GiftingMessage",
    "TimerMessage",
    // 10. Credits
    "AddSideCash",
    "SetSideCash",
    "GetSideCash",
    "GetSideSpice",
    // 11. Camera (main)
    "CameraLookAtPoint",
    "CameraPanToPoint",
    "CameraScrollToPoint",
    "CameraTrackObject",
    "CameraStartRotate",
    "CameraStopRotate",
    "CameraIsSpinning",
    "CameraStore",
    "CameraRestore",
    // 11. Camera (picture-in-picture)
    "CameraPIPLookAtPoint",
    "CameraPIPPanToPoint",
    "CameraPIPScrollToPoint",
    "CameraPIPTrackObject",
    "CameraPIPStartRotate",
    "CameraPIPStopRotate",
    "CameraPIPIsSpinning",
    "CameraPIPStore",
    "CameraPIPRestore",
    // 12. Fog / radar
    "RemoveShroud",
    "ReplaceShroud",
    "RemoveMapShroud",
    "RadarEnabled",
    "RadarAlert",
    // 13. Victory / defeat
    "MissionOutcome",
    "EndGameWin",
    "EndGameLose",
    "NormalConditionLose",
    // 14. Events
    "EventObjectDestroyed",
    "EventObjectDelivered",
    "EventObjectConstructed",
    "EventObjectTypeConstructed",
    "EventSideAttacksSide",
    "EventObjectAttacksSide",
    // 15. Superweapons / worms / air strikes
    "ForceWormStrike",
    "SideNuke",
    "FireSpecialWeapon",
    "AirStrike",
    "AirStrikeDone",
    // 16. Crates
    "NewCrateUnit",
    "NewCrateBomb",
    "NewCrateStealth",
    "NewCrateCash",
    "NewCrateShroud",
    // 17. Misc
    "SetTilePos",
    "Neg",
    "SetValue",
    "SetThreatLevel",
    "DisableUI",
    "EnableUI",
    "FreezeGame",
    "UnFreezeGame",
];

fn build_function_table() -> Vec<FuncSpec> {
    let mut table = Vec::with_capacity(FUNCTION_TABLE_LEN);
    for (id, name) in NAMED_FUNCTIONS.iter().enumerate() {
        table.push(FuncSpec {
            id: id as u16,
            name,
        });
    }
    while table.len() < FUNCTION_TABLE_LEN {
        let id = table.len() as u16;
        let name: &'static str = Box::leak(format!("Unused{id}").into_boxed_str());
        table.push(FuncSpec { id, name });
    }
    table
}

static FUNCTION_TABLE: OnceLock<Vec<FuncSpec>> = OnceLock::new();

pub fn function_table() -> &'static [FuncSpec] {
    FUNCTION_TABLE.get_or_init(build_function_table)
}

pub fn function_spec(id: u16) -> Option<&'static FuncSpec> {
    function_table().get(id as usize)
}

pub fn function_id_by_name(name: &str) -> Option<u16> {
    function_table()
        .iter()
        .find(|f| f.name == name)
        .map(|f| f.id)
}

/// Keyword ids `162..181`, in the exact order §6.2 specifies. `int`/`obj`/
/// `pos` are the slot-declaration keywords parsed at program start;
/// `endif` closes a block (there is no `begin` — a block's body runs from
/// right after its condition to the next `else`/`endif`).
pub const KEYWORD_NAMES: [&str; 19] = [
    "int", "obj", "pos", "if", "else", "endif", "==", "!=", ">=", "<=", ">", "<", "&&", "||",
    "FALSE", "TRUE", "+", "-", "=",
];

pub const KW_INT: u16 = KEYWORD_THRESHOLD;
pub const KW_OBJ: u16 = KEYWORD_THRESHOLD + 1;
pub const KW_POS: u16 = KEYWORD_THRESHOLD + 2;
pub const KW_IF: u16 = KEYWORD_THRESHOLD + 3;
pub const KW_ELSE: u16 = KEYWORD_THRESHOLD + 4;
pub const KW_ENDIF: u16 = KEYWORD_THRESHOLD + 5;
pub const KW_EQ: u16 = KEYWORD_THRESHOLD + 6;
pub const KW_NE: u16 = KEYWORD_THRESHOLD + 7;
pub const KW_GE: u16 = KEYWORD_THRESHOLD + 8;
pub const KW_LE: u16 = KEYWORD_THRESHOLD + 9;
pub const KW_GT: u16 = KEYWORD_THRESHOLD + 10;
pub const KW_LT: u16 = KEYWORD_THRESHOLD + 11;
pub const KW_AND: u16 = KEYWORD_THRESHOLD + 12;
pub const KW_OR: u16 = KEYWORD_THRESHOLD + 13;
pub const KW_FALSE: u16 = KEYWORD_THRESHOLD + 14;
pub const KW_TRUE: u16 = KEYWORD_THRESHOLD + 15;
pub const KW_PLUS: u16 = KEYWORD_THRESHOLD + 16;
pub const KW_MINUS: u16 = KEYWORD_THRESHOLD + 17;
pub const KW_ASSIGN: u16 = KEYWORD_THRESHOLD + 18;

pub fn keyword_name(id: u16) -> Option<&'static str> {
    let index = id.checked_sub(KEYWORD_THRESHOLD)?;
    KEYWORD_NAMES.get(index as usize).copied()
}

pub fn is_keyword_id(id: u16) -> bool {
    id >= KEYWORD_THRESHOLD && (id - KEYWORD_THRESHOLD) < KEYWORD_NAMES.len() as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_table_is_exactly_162_entries_each_uniquely_named() {
        assert_eq!(function_table().len(), FUNCTION_TABLE_LEN);
        let mut names: Vec<&str> = function_table().iter().map(|f| f.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), FUNCTION_TABLE_LEN);
    }

    #[test]
    fn reserved_tail_ids_are_named_but_inert() {
        let last = function_spec((FUNCTION_TABLE_LEN - 1) as u16).unwrap();
        assert!(last.name.starts_with("Unused"));
    }

    #[test]
    fn named_function_lookup_round_trips() {
        let id = function_id_by_name("NewObject").unwrap();
        assert_eq!(function_spec(id).unwrap().name, "NewObject");
    }

    #[test]
    fn keyword_threshold_is_authoritative() {
        assert_eq!(keyword_name(KEYWORD_THRESHOLD), Some("int"));
        assert_eq!(keyword_name(KW_ASSIGN), Some("="));
        assert_eq!(keyword_name(KW_ASSIGN + 1), None);
        assert_eq!(keyword_name(KEYWORD_THRESHOLD - 1), None);
    }

    #[test]
    fn dispatch_group_names_are_present_at_expected_ids() {
        assert_eq!(function_spec(0).unwrap().name, "ModelTick");
        assert_eq!(
            function_spec((NAMED_FUNCTIONS.len() - 1) as u16).unwrap().name,
            "UnFreezeGame"
        );
    }
}
