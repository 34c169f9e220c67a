//! Save/restore layer (§4.G, §6.4): converts live `mission-core` state
//! into a plain, portable `MissionSaveState` and back, rewriting every
//! entity handle through a host-supplied dense-index bijection so a save
//! file never embeds raw entity ids that the host may not reissue on
//! load.
//!
//! Kept as its own crate, the way the teacher workspace keeps its save
//! format separate from the live simulation types it snapshots: the
//! serialization shape is a distinct concern from the VM state it mirrors,
//! and changes to one (a save-format migration) shouldn't force a
//! recompile of the other.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use mission_core::dispatch::state::{
    CameraSnapshot, CameraState, CrateKind, CrateRecord, DispatchState,
};
use mission_core::rules::{PendingDelayed, RuleRunner};
use mission_core::sides::{Relation, SideTable};
use mission_core::world::{EntityId, Pos, Side, NO_ENTITY};
use mission_core::Mission;

/// A host-assigned compact identifier, bijective with live entity handles
/// at the moment of save (GLOSSARY "Dense index").
pub type DenseIndex = i64;

#[derive(Debug, Error)]
pub enum SaveError {
    /// The save bytes don't parse as `MissionSaveState` JSON at all — a
    /// host bug (corrupt save file), not a script-authored mistake, so
    /// unlike decoder/dispatch failures this bubbles up as `Err` rather
    /// than degrading silently (§7 kind 5 vs. kinds 1-4).
    #[error("malformed save state: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipEntry {
    pub a: Side,
    pub b: Side,
    pub rel: Relation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingDelayedEntry {
    pub rule_id: String,
    pub execute_tick: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirStrikeEntry {
    pub strike_id: i32,
    pub unit_ids: Vec<DenseIndex>,
    pub target: Pos,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraEntry {
    pub track_dense: Option<DenseIndex>,
    pub pos: Pos,
    pub zoom: f32,
    pub spin_active: bool,
    pub spin_speed: i32,
    pub spin_dir: i32,
    pub stored: Option<CameraSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrateEntry {
    pub crate_id: i32,
    pub pos: Pos,
    pub kind: CrateKind,
}

/// §3.5 dispatch runtime state with every entity field rewritten through
/// the dense-index mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchSaveState {
    pub tick_count: u64,
    pub rng_state: [u32; 4],
    pub air_strikes: Vec<AirStrikeEntry>,
    pub used_base_points: Vec<usize>,
    pub side_colors: Vec<(Side, i32)>,
    pub threat_levels: HashMap<String, i32>,
    pub main_camera: CameraEntry,
    pub pip_camera: CameraEntry,
    pub side_base_positions: Vec<(Side, Pos)>,
    pub crates: Vec<CrateEntry>,
    pub next_crate_id: i32,
    pub ui_enabled: bool,
    pub game_frozen: bool,
    pub radar_force_enabled: bool,
    pub mission_outcome: Option<bool>,
}

/// The `.tok` side's portion of the save state (§6.4 `tokState`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokSaveState {
    pub int_vars: Vec<i32>,
    pub obj_vars: Vec<DenseIndex>,
    pub pos_vars: Vec<Pos>,
    pub next_side_id: Side,
    pub relationships: Vec<RelationshipEntry>,
    #[serde(default)]
    pub dispatch_state: Option<DispatchSaveState>,
}

/// The complete portable save shape (§6.4 `MissionSaveState`). Either half
/// may be absent: a pure `.tok` mission has no rule-runner fields worth
/// persisting beyond their empty defaults, and a pure JSON mission has no
/// `tok_state`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionSaveState {
    #[serde(default)]
    pub fired_rule_ids: Vec<String>,
    #[serde(default)]
    pub flags: HashMap<String, bool>,
    #[serde(default)]
    pub group_entities: HashMap<String, Vec<DenseIndex>>,
    #[serde(default)]
    pub disabled_rules: Vec<String>,
    #[serde(default)]
    pub repeat_counts: HashMap<String, u32>,
    #[serde(default)]
    pub pending_delayed: Vec<PendingDelayedEntry>,
    #[serde(default)]
    pub tok_state: Option<TokSaveState>,
}

fn to_dense(entity_to_dense: &HashMap<EntityId, DenseIndex>, eid: EntityId) -> DenseIndex {
    if eid == NO_ENTITY {
        return -1;
    }
    entity_to_dense.get(&eid).copied().unwrap_or(-1)
}

/// Entities missing from `dense_to_entity` (no longer live at restore
/// time) resolve to `NO_ENTITY` rather than erroring (§4.G "Restore is
/// the inverse").
fn from_dense(dense_to_entity: &HashMap<DenseIndex, EntityId>, dense: DenseIndex) -> EntityId {
    if dense < 0 {
        return NO_ENTITY;
    }
    dense_to_entity.get(&dense).copied().unwrap_or(NO_ENTITY)
}

fn save_camera(camera: &CameraState, entity_to_dense: &HashMap<EntityId, DenseIndex>) -> CameraEntry {
    CameraEntry {
        track_dense: camera.track_eid.map(|eid| to_dense(entity_to_dense, eid)),
        pos: camera.pos,
        zoom: camera.zoom,
        spin_active: camera.spin.active,
        spin_speed: camera.spin.speed,
        spin_dir: camera.spin.dir,
        stored: camera.stored,
    }
}

fn restore_camera(entry: &CameraEntry, dense_to_entity: &HashMap<DenseIndex, EntityId>) -> CameraState {
    use mission_core::dispatch::state::CameraSpin;
    CameraState {
        track_eid: entry
            .track_dense
            .map(|d| from_dense(dense_to_entity, d))
            .filter(|&eid| eid != NO_ENTITY),
        pos: entry.pos,
        zoom: entry.zoom,
        spin: CameraSpin {
            active: entry.spin_active,
            speed: entry.spin_speed,
            dir: entry.spin_dir,
        },
        stored: entry.stored,
    }
}

fn save_dispatch_state(
    state: &DispatchState,
    entity_to_dense: &HashMap<EntityId, DenseIndex>,
) -> DispatchSaveState {
    DispatchSaveState {
        tick_count: state.tick_count,
        rng_state: state.rng.state().0,
        air_strikes: state
            .air_strikes
            .iter()
            .map(|r| AirStrikeEntry {
                strike_id: r.strike_id,
                unit_ids: r
                    .unit_ids
                    .iter()
                    .map(|&eid| to_dense(entity_to_dense, eid))
                    .collect(),
                target: r.target,
            })
            .collect(),
        used_base_points: state.used_base_points.iter().copied().collect(),
        side_colors: state.side_colors.iter().map(|(&s, &c)| (s, c)).collect(),
        threat_levels: state.threat_levels.clone(),
        main_camera: save_camera(&state.main_camera, entity_to_dense),
        pip_camera: save_camera(&state.pip_camera, entity_to_dense),
        side_base_positions: state
            .side_base_positions
            .iter()
            .map(|(&s, &p)| (s, p))
            .collect(),
        crates: state
            .crates
            .iter()
            .map(|c| CrateEntry {
                crate_id: c.crate_id,
                pos: c.pos,
                kind: c.kind,
            })
            .collect(),
        next_crate_id: state.next_crate_id,
        ui_enabled: state.ui_enabled,
        game_frozen: state.game_frozen,
        radar_force_enabled: state.radar_force_enabled,
        mission_outcome: state.mission_outcome,
    }
}

fn restore_dispatch_state(
    entry: &DispatchSaveState,
    dense_to_entity: &HashMap<DenseIndex, EntityId>,
) -> DispatchState {
    use mission_core::dispatch::state::AirStrikeRecord as Record;
    let mut state = DispatchState::new(0);
    state.rng = mission_rng::Rng::from_state(mission_rng::RngState(entry.rng_state));
    state.tick_count = entry.tick_count;
    state.air_strikes = entry
        .air_strikes
        .iter()
        .map(|e| Record {
            strike_id: e.strike_id,
            unit_ids: e
                .unit_ids
                .iter()
                .map(|&d| from_dense(dense_to_entity, d))
                .filter(|&eid| eid != NO_ENTITY)
                .collect(),
            target: e.target,
        })
        .collect();
    state.used_base_points = entry.used_base_points.iter().copied().collect();
    state.side_colors = entry.side_colors.iter().copied().collect();
    state.threat_levels = entry.threat_levels.clone();
    state.main_camera = restore_camera(&entry.main_camera, dense_to_entity);
    state.pip_camera = restore_camera(&entry.pip_camera, dense_to_entity);
    state.side_base_positions = entry.side_base_positions.iter().copied().collect();
    state.crates = entry
        .crates
        .iter()
        .map(|c| CrateRecord {
            crate_id: c.crate_id,
            pos: c.pos,
            kind: c.kind,
        })
        .collect();
    state.next_crate_id = entry.next_crate_id;
    state.ui_enabled = entry.ui_enabled;
    state.game_frozen = entry.game_frozen;
    state.radar_force_enabled = entry.radar_force_enabled;
    state.mission_outcome = entry.mission_outcome;
    state
}

/// Serializes a `.tok` mission's live state (§6.4 `tokState`). `sides` is
/// read from `mission.dispatch_state().sides` (carried there per §3.5).
pub fn save_tok_state(
    mission: &Mission,
    entity_to_dense: &HashMap<EntityId, DenseIndex>,
) -> TokSaveState {
    let slots = mission.slots();
    let dispatch_state = mission.dispatch_state();
    let sides: &SideTable = &dispatch_state.sides;
    let relationships = sides
        .explicit_relations()
        .map(|(&(a, b), &rel)| RelationshipEntry { a, b, rel })
        .collect();
    TokSaveState {
        int_vars: slots.int_vars().to_vec(),
        obj_vars: slots
            .obj_vars()
            .iter()
            .map(|&eid| to_dense(entity_to_dense, eid))
            .collect(),
        pos_vars: slots.pos_vars().to_vec(),
        next_side_id: sides.next_dynamic_side(),
        relationships,
        dispatch_state: Some(save_dispatch_state(dispatch_state, entity_to_dense)),
    }
}

/// Restores a `.tok` mission's live state into `mission` in place
/// (§4.G "Restore is the inverse"). `mission` must already be `load`ed
/// from the same script bytes; only its variable slots and dispatch state
/// are overwritten.
pub fn restore_tok_state(
    mission: &mut Mission,
    state: &TokSaveState,
    dense_to_entity: &HashMap<DenseIndex, EntityId>,
) {
    let obj_vars: Vec<EntityId> = state
        .obj_vars
        .iter()
        .map(|&d| from_dense(dense_to_entity, d))
        .collect();
    mission.slots_mut().set_int_vars(state.int_vars.clone());
    mission.slots_mut().set_obj_vars(obj_vars);
    mission.slots_mut().set_pos_vars(state.pos_vars.clone());

    let dispatch_state = mission.dispatch_state_mut();
    if let Some(saved) = &state.dispatch_state {
        *dispatch_state = restore_dispatch_state(saved, dense_to_entity);
    }
    dispatch_state.sides.set_next_dynamic_side(state.next_side_id);
    let mut relations = HashMap::new();
    for entry in &state.relationships {
        relations.insert((entry.a, entry.b), entry.rel);
    }
    dispatch_state.sides.set_explicit_relations(relations);
}

/// Serializes a JSON-mission rule runner's state (§6.4 minus `tokState`).
pub fn save_rule_runtime(
    runner: &RuleRunner,
    entity_to_dense: &HashMap<EntityId, DenseIndex>,
) -> MissionSaveState {
    let runtime = runner.runtime();
    MissionSaveState {
        fired_rule_ids: runtime.fired_rule_ids.iter().cloned().collect(),
        flags: runtime.flags.clone(),
        group_entities: runtime
            .group_entities
            .iter()
            .map(|(name, eids)| {
                (
                    name.clone(),
                    eids.iter().map(|&eid| to_dense(entity_to_dense, eid)).collect(),
                )
            })
            .collect(),
        disabled_rules: runtime.disabled_rules.iter().cloned().collect(),
        repeat_counts: runtime.repeat_counts.clone(),
        pending_delayed: runtime
            .pending_delayed
            .iter()
            .map(|p| PendingDelayedEntry {
                rule_id: p.rule_id.clone(),
                execute_tick: p.execute_tick,
            })
            .collect(),
        tok_state: None,
    }
}

/// Restores a rule runner's runtime state in place, dropping any group
/// member whose dense index no longer maps to a live entity (§4.G
/// "dropped" for group memberships).
pub fn restore_rule_runtime(
    runner: &mut RuleRunner,
    state: &MissionSaveState,
    dense_to_entity: &HashMap<DenseIndex, EntityId>,
) {
    let group_entities = state
        .group_entities
        .iter()
        .map(|(name, dense_ids)| {
            let entities = dense_ids
                .iter()
                .map(|&d| from_dense(dense_to_entity, d))
                .filter(|&eid| eid != NO_ENTITY)
                .collect();
            (name.clone(), entities)
        })
        .collect();
    runner.set_runtime(mission_core::rules::RuleRuntime {
        fired_rule_ids: state.fired_rule_ids.iter().cloned().collect(),
        flags: state.flags.clone(),
        group_entities,
        disabled_rules: state.disabled_rules.iter().cloned().collect(),
        repeat_counts: state.repeat_counts.clone(),
        pending_delayed: state
            .pending_delayed
            .iter()
            .map(|p| PendingDelayed {
                rule_id: p.rule_id.clone(),
                execute_tick: p.execute_tick,
            })
            .collect(),
    });
}

/// Parses previously-serialized JSON bytes into a `MissionSaveState`
/// (§7 kind 5: malformed save bytes are a host bug, so this is the one
/// place in the save layer that returns `Err` for bad input).
pub fn from_json(bytes: &[u8]) -> Result<MissionSaveState, SaveError> {
    Ok(serde_json::from_slice(bytes)?)
}

pub fn to_json(state: &MissionSaveState) -> Result<Vec<u8>, SaveError> {
    Ok(serde_json::to_vec(state)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mission_core::ast::{VarKind, VarRef};
    use mission_core::value::Value;

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
    fn round_tripping_tok_state_is_idempotent() {
        use mission_core::decoder::tables::{KW_ENDIF, KW_IF};
        let token_stream = [0x80, KW_IF as u8, b'1', 0x80, KW_ENDIF as u8];
        let bytes = build_container(1, &token_stream);
        let mut mission = Mission::load(&bytes, 7, Vec::new()).unwrap();
        mission
            .slots_mut()
            .set(VarRef { kind: VarKind::Int, index: 0 }, Value::Int(42));
        mission.dispatch_state_mut().tick_count = 9;

        let entity_to_dense: HashMap<EntityId, DenseIndex> = HashMap::new();
        let saved = save_tok_state(&mission, &entity_to_dense);
        let json = serde_json::to_vec(&saved).unwrap();
        let reloaded: TokSaveState = serde_json::from_slice(&json).unwrap();

        let mut restored = Mission::load(&bytes, 1, Vec::new()).unwrap();
        let dense_to_entity: HashMap<DenseIndex, EntityId> = HashMap::new();
        restore_tok_state(&mut restored, &reloaded, &dense_to_entity);

        assert_eq!(
            restored.slots().get(VarRef { kind: VarKind::Int, index: 0 }),
            Value::Int(42)
        );
        assert_eq!(restored.dispatch_state().tick_count, 9);
    }

    #[test]
    fn unmapped_dense_index_resolves_to_no_entity_not_an_error() {
        let dense_to_entity: HashMap<DenseIndex, EntityId> = HashMap::new();
        assert_eq!(from_dense(&dense_to_entity, 7), NO_ENTITY);
    }

    #[test]
    fn malformed_json_is_reported_as_an_error_not_silently_dropped() {
        assert!(from_json(b"not json").is_err());
    }

    #[test]
    fn camera_tracking_survives_a_round_trip_through_dense_indices() {
        let mut state = DispatchState::new(1);
        state.camera_mut(false).track_eid = Some(5);
        state.camera_mut(false).spin.active = true;
        state.camera_mut(false).spin.speed = 6;
        state.camera_mut(false).spin.dir = 2;

        let mut entity_to_dense = HashMap::new();
        entity_to_dense.insert(5, 0);
        let saved = save_dispatch_state(&state, &entity_to_dense);

        let mut dense_to_entity = HashMap::new();
        dense_to_entity.insert(0, 5);
        let restored = restore_dispatch_state(&saved, &dense_to_entity);

        assert_eq!(restored.main_camera.track_eid, Some(5));
        assert!(restored.main_camera.spin.active);
        assert_eq!(restored.main_camera.spin.dir, 2);
    }
}
