//! A real (non-`#[cfg(test)]`-gated) `WorldView` double plus small
//! hand-built `.tok` and mission-script fixtures, shared by integration
//! tests in `mission-core`, `mission-save`, and `mission-cli` — unlike
//! `mission_core::world::tests_support::NullWorld`, which only exists
//! inside `mission-core`'s own unit tests and never observes its calls,
//! `StubWorld` actually tracks entities so cross-crate tests can assert on
//! what a tick did.

use std::collections::HashMap;

use mission_core::world::{
    EntityId, MapMetadata, NotificationCategory, Pos, Side, WorldView, NO_ENTITY,
};

#[derive(Debug, Clone)]
pub struct StubEntity {
    pub type_name: String,
    pub owner: Side,
    pub pos: Pos,
    pub health: i32,
    pub max_health: i32,
    pub is_building: bool,
    pub has_active_move: bool,
}

/// An in-memory `WorldView` backed by a flat entity table, a side cash
/// ledger, and a fixed `MapMetadata` — enough surface for a mission script
/// to run a handful of ticks against and be asserted on afterward.
#[derive(Debug, Default)]
pub struct StubWorld {
    entities: HashMap<EntityId, StubEntity>,
    next_id: EntityId,
    cash: HashMap<Side, i32>,
    metadata: MapMetadata,
    unit_types: Vec<String>,
    building_types: Vec<String>,
    campaign_strings: HashMap<i32, String>,
    revealed_radius: f32,
    mission_outcome: Option<bool>,
    notifications: Vec<(String, NotificationCategory)>,
    sfx_played: Vec<String>,
    camera_target: Option<Pos>,
}

impl StubWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_building_types(mut self, names: &[&str]) -> Self {
        self.building_types = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_unit_types(mut self, names: &[&str]) -> Self {
        self.unit_types = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_map_metadata(mut self, metadata: MapMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Directly inserts an entity, bypassing `spawn_unit`/`spawn_building`,
    /// for tests that need a known entity id up front.
    pub fn insert_entity(&mut self, eid: EntityId, entity: StubEntity) {
        self.next_id = self.next_id.max(eid + 1);
        self.entities.insert(eid, entity);
    }

    pub fn entity(&self, eid: EntityId) -> Option<&StubEntity> {
        self.entities.get(&eid)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn notifications(&self) -> &[(String, NotificationCategory)] {
        &self.notifications
    }

    pub fn sfx_played(&self) -> &[String] {
        &self.sfx_played
    }

    pub fn camera_target(&self) -> Option<Pos> {
        self.camera_target
    }

    pub fn mission_outcome(&self) -> Option<bool> {
        self.mission_outcome
    }

    pub fn set_campaign_string(&mut self, id: i32, text: &str) {
        self.campaign_strings.insert(id, text.to_string());
    }

    fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl WorldView for StubWorld {
    fn live_units_of(&self, side: Side) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, e)| !e.is_building && e.owner == side && e.health > 0)
            .map(|(&eid, _)| eid)
            .collect()
    }

    fn live_buildings_of(&self, side: Side) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, e)| e.is_building && e.owner == side && e.health > 0)
            .map(|(&eid, _)| eid)
            .collect()
    }

    fn position(&self, eid: EntityId) -> Option<Pos> {
        self.entities.get(&eid).map(|e| e.pos)
    }

    fn owner(&self, eid: EntityId) -> Option<Side> {
        self.entities.get(&eid).map(|e| e.owner)
    }

    fn health(&self, eid: EntityId) -> i32 {
        self.entities.get(&eid).map(|e| e.health).unwrap_or(0)
    }

    fn max_health(&self, eid: EntityId) -> i32 {
        self.entities.get(&eid).map(|e| e.max_health).unwrap_or(0)
    }

    fn type_name(&self, eid: EntityId) -> Option<String> {
        self.entities.get(&eid).map(|e| e.type_name.clone())
    }

    fn has_active_move(&self, eid: EntityId) -> bool {
        self.entities.get(&eid).is_some_and(|e| e.has_active_move)
    }

    fn spawn_unit(&mut self, type_name: &str, owner: Side, pos: Pos) -> EntityId {
        let id = self.next_entity_id();
        self.entities.insert(
            id,
            StubEntity {
                type_name: type_name.to_string(),
                owner,
                pos,
                health: 100,
                max_health: 100,
                is_building: false,
                has_active_move: false,
            },
        );
        id
    }

    fn spawn_building(&mut self, type_name: &str, owner: Side, pos: Pos) -> EntityId {
        let id = self.next_entity_id();
        self.entities.insert(
            id,
            StubEntity {
                type_name: type_name.to_string(),
                owner,
                pos,
                health: 500,
                max_health: 500,
                is_building: true,
                has_active_move: false,
            },
        );
        id
    }

    fn set_health(&mut self, eid: EntityId, health: i32) {
        if let Some(e) = self.entities.get_mut(&eid) {
            e.health = health;
        }
    }

    fn set_owner(&mut self, eid: EntityId, side: Side) {
        if let Some(e) = self.entities.get_mut(&eid) {
            e.owner = side;
        }
    }

    fn morph_object(&mut self, eid: EntityId, type_name: &str, owner: Side) {
        let pos = self.entities.get(&eid).map(|e| e.pos).unwrap_or(Pos::ZERO);
        let is_building = self.entities.get(&eid).is_some_and(|e| e.is_building);
        self.entities.remove(&eid);
        if is_building {
            self.spawn_building(type_name, owner, pos);
        } else {
            self.spawn_unit(type_name, owner, pos);
        }
    }

    fn issue_move(&mut self, eid: EntityId, pos: Pos) {
        if let Some(e) = self.entities.get_mut(&eid) {
            e.pos = pos;
            e.has_active_move = true;
        }
    }

    fn clear_move(&mut self, eid: EntityId) {
        if let Some(e) = self.entities.get_mut(&eid) {
            e.has_active_move = false;
        }
    }

    fn set_attack_move(&mut self, eids: &[EntityId]) {
        for &eid in eids {
            if let Some(e) = self.entities.get_mut(&eid) {
                e.has_active_move = true;
            }
        }
    }

    fn kill_entity(&mut self, eid: EntityId) {
        if let Some(e) = self.entities.get_mut(&eid) {
            e.health = 0;
        }
    }

    fn deploy(&mut self, _eid: EntityId) {}

    fn undeploy(&mut self, _eid: EntityId) {}

    fn sell_building(&mut self, eid: EntityId) {
        self.entities.remove(&eid);
    }

    fn reveal_area(&mut self, _pos: Pos, radius: f32) {
        self.revealed_radius = self.revealed_radius.max(radius);
    }

    fn cover_area(&mut self, _pos: Pos, _radius: f32) {}

    fn reveal_all(&mut self) {
        self.revealed_radius = f32::MAX;
    }

    fn set_radar_force_enabled(&mut self, _enabled: bool) {}

    fn radar_pulse(&mut self, _pos: Pos) {}

    fn pan_camera_to(&mut self, pos: Pos) {
        self.camera_target = Some(pos);
    }

    fn play_sfx(&mut self, sfx_id: &str) {
        self.sfx_played.push(sfx_id.to_string());
    }

    fn push_notification(&mut self, text: &str, category: NotificationCategory) {
        self.notifications.push((text.to_string(), category));
    }

    fn set_mission_outcome(&mut self, victory: bool) {
        self.mission_outcome = Some(victory);
    }

    fn campaign_string(&self, id: i32) -> Option<String> {
        self.campaign_strings.get(&id).cloned()
    }

    fn map_metadata(&self) -> &MapMetadata {
        &self.metadata
    }

    fn unit_type_names(&self) -> &[String] {
        &self.unit_types
    }

    fn building_type_names(&self) -> &[String] {
        &self.building_types
    }

    fn side_cash(&self, side: Side) -> i32 {
        self.cash.get(&side).copied().unwrap_or(0)
    }

    fn set_side_cash(&mut self, side: Side, amount: i32) {
        self.cash.insert(side, amount);
    }
}

/// Builds a minimal valid `.tok` container around a hand-written token
/// stream, for tests that want to drive `Mission::load` without going
/// through the full compiler-lowering pipeline (§6.1 header format: a
/// little-endian payload length, a little-endian null-byte count, then
/// the payload itself). `leading_empty_segments` controls the declared
/// variable-slot count, which the container format encodes as a run of
/// empty (all-zero) segments before the first non-empty one.
pub fn build_tok_container(leading_empty_segments: usize, token_stream: &[u8]) -> Vec<u8> {
    let mut payload = Vec::new();
    for _ in 0..leading_empty_segments {
        payload.push(0);
    }
    payload.extend_from_slice(token_stream);
    let null_count = payload.iter().filter(|&&b| b == 0).count() as u32;
    let mut out = (payload.len() as u32).to_le_bytes().to_vec();
    out.extend_from_slice(&null_count.to_le_bytes());
    out.extend_from_slice(&payload);
    out
}

/// A trivial always-true `.tok` program (`if (1) endif`), useful as a
/// smoke-test fixture that just needs to tick without panicking.
pub fn always_true_tok() -> Vec<u8> {
    use mission_core::decoder::tables::{KW_ENDIF, KW_IF};
    let token_stream = [0x80, KW_IF as u8, b'1', 0x80, KW_ENDIF as u8];
    build_tok_container(1, &token_stream)
}

/// A minimal one-rule mission script JSON fixture: grants 500 credits to
/// side 0 the moment the mission starts, firing exactly once.
pub fn one_shot_credit_grant_script_json() -> String {
    r#"{
        "id": "fixture-credit-grant",
        "name": "Credit Grant Fixture",
        "victoryCondition": {"kind": "survive"},
        "objectiveLabel": "Survive",
        "entityGroups": [],
        "rules": [{
            "id": "grant",
            "trigger": {"kind": "timer", "tick": 0},
            "actions": [{"kind": "grantCredits", "owner": 0, "amount": 500}],
            "once": true,
            "delay": 0,
            "enabled": true
        }]
    }"#
    .to_string()
}

pub fn no_entity() -> EntityId {
    NO_ENTITY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawned_units_are_queryable_by_side() {
        let mut world = StubWorld::new();
        let eid = world.spawn_unit("rifle_infantry", 0, Pos { x: 1.0, z: 2.0 });
        assert_eq!(world.live_units_of(0), vec![eid]);
        assert!(world.live_units_of(1).is_empty());
        assert_eq!(world.health(eid), 100);
    }

    #[test]
    fn killed_entity_has_zero_health_but_still_exists() {
        let mut world = StubWorld::new();
        let eid = world.spawn_unit("rifle_infantry", 0, Pos::ZERO);
        world.kill_entity(eid);
        assert_eq!(world.health(eid), 0);
        assert!(world.live_units_of(0).is_empty());
    }

    #[test]
    fn morph_object_replaces_entity_at_the_same_position() {
        let mut world = StubWorld::new();
        let eid = world.spawn_unit("rifle_infantry", 0, Pos { x: 3.0, z: 4.0 });
        world.morph_object(eid, "rocket_infantry", 0);
        assert!(world.entity(eid).is_none());
        let replacement = world
            .live_units_of(0)
            .into_iter()
            .next()
            .expect("morph spawns a replacement");
        assert_eq!(world.type_name(replacement).as_deref(), Some("rocket_infantry"));
        assert_eq!(world.position(replacement), Some(Pos { x: 3.0, z: 4.0 }));
    }

    #[test]
    fn always_true_fixture_decodes_to_one_block() {
        let bytes = always_true_tok();
        let mission = mission_core::Mission::load(&bytes, 1, Vec::new()).unwrap();
        assert_eq!(mission.program().blocks.len(), 1);
    }

    #[test]
    fn credit_grant_fixture_parses_as_a_mission_script() {
        let json = one_shot_credit_grant_script_json();
        let script: mission_core::rules::MissionScript = serde_json::from_str(&json).unwrap();
        assert_eq!(script.rules.len(), 1);
    }
}
