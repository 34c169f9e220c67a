//! World-view interface (§4.H): the minimal capability surface the core
//! requires of the host simulation. Naming is illustrative per the spec;
//! implementations are free to back these calls however they like.

/// Opaque entity handle, as minted by the host simulation.
pub type EntityId = i64;

/// Sentinel for "no entity" in an `Obj` variable slot.
pub const NO_ENTITY: EntityId = -1;

/// A side identifier. 0 is the player, 1 is the canonical enemy, 255 is
/// neutral; sides 2..=254 are allocated at runtime by `CreateSide`.
pub type Side = u8;

pub const SIDE_PLAYER: Side = 0;
pub const SIDE_ENEMY: Side = 1;
pub const SIDE_NEUTRAL: Side = 255;

/// World units per map tile, used to convert `EntrancePoint` tile
/// coordinates into world-space positions.
pub const TILE_SIZE: f32 = 2.0;

/// A world-space point (already in world units, not map tiles).
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Pos {
    pub x: f32,
    pub z: f32,
}

impl Pos {
    pub const ZERO: Pos = Pos { x: 0.0, z: 0.0 };

    pub fn distance(&self, other: Pos) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }
}

/// Message categories used to color-code host notifications (§4.E group 9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    Message,
    Gifting,
    Timer,
}

/// A single entrance marker from map metadata.
///
/// `marker` matches a side id, or `99` for the neutral entrance.
#[derive(Debug, Clone, Copy)]
pub struct EntrancePoint {
    pub marker: i32,
    /// Tile coordinates; the dispatcher multiplies by `TILE_SIZE` to reach
    /// world space.
    pub tile_x: i32,
    pub tile_z: i32,
}

/// Static, per-mission map facts the host exposes read-only.
#[derive(Debug, Clone, Default)]
pub struct MapMetadata {
    pub entrances: Vec<EntrancePoint>,
    /// Script points in world coordinates, `GetScriptPoint(n)` indexes
    /// `script_points[n - 1]`.
    pub script_points: Vec<Pos>,
    /// Candidate AI base spawn points, in world coordinates.
    pub base_spawn_points: Vec<Pos>,
}

/// The minimal read/mutate seam the VM requires from the simulation host.
///
/// The core never stores raw entity ids across a save boundary; it always
/// round-trips them through the host-supplied dense-index mapping (see the
/// save layer). This trait is the *live* surface only.
pub trait WorldView {
    // --- Entity queries -------------------------------------------------
    fn live_units_of(&self, side: Side) -> Vec<EntityId>;
    fn live_buildings_of(&self, side: Side) -> Vec<EntityId>;
    fn position(&self, eid: EntityId) -> Option<Pos>;
    fn owner(&self, eid: EntityId) -> Option<Side>;
    fn health(&self, eid: EntityId) -> i32;
    fn max_health(&self, eid: EntityId) -> i32;
    fn type_name(&self, eid: EntityId) -> Option<String>;
    /// `true` while the entity has an active movement/attack-move order.
    fn has_active_move(&self, eid: EntityId) -> bool;

    // --- Mutations --------------------------------------------------------
    fn spawn_unit(&mut self, type_name: &str, owner: Side, pos: Pos) -> EntityId;
    fn spawn_building(&mut self, type_name: &str, owner: Side, pos: Pos) -> EntityId;
    fn set_health(&mut self, eid: EntityId, health: i32);
    fn set_owner(&mut self, eid: EntityId, side: Side);
    /// Destroy `eid` and spawn a new entity of `type_name` owned by `owner`
    /// at the destroyed entity's former position (used by `ObjectChange`).
    fn morph_object(&mut self, eid: EntityId, type_name: &str, owner: Side);
    fn issue_move(&mut self, eid: EntityId, pos: Pos);
    fn clear_move(&mut self, eid: EntityId);
    fn set_attack_move(&mut self, eids: &[EntityId]);
    /// Sets health to zero and raises the host's own death event.
    fn kill_entity(&mut self, eid: EntityId);
    fn deploy(&mut self, eid: EntityId);
    fn undeploy(&mut self, eid: EntityId);
    fn sell_building(&mut self, eid: EntityId);

    // --- Fog / radar / camera services ------------------------------------
    fn reveal_area(&mut self, pos: Pos, radius: f32);
    fn cover_area(&mut self, pos: Pos, radius: f32);
    fn reveal_all(&mut self);
    fn set_radar_force_enabled(&mut self, enabled: bool);
    fn radar_pulse(&mut self, pos: Pos);
    fn pan_camera_to(&mut self, pos: Pos);
    fn play_sfx(&mut self, sfx_id: &str);
    fn push_notification(&mut self, text: &str, category: NotificationCategory);

    // --- Outcome -----------------------------------------------------------
    fn set_mission_outcome(&mut self, victory: bool);

    // --- Registries ---------------------------------------------------------
    fn campaign_string(&self, id: i32) -> Option<String>;
    fn map_metadata(&self) -> &MapMetadata;
    fn unit_type_names(&self) -> &[String];
    fn building_type_names(&self) -> &[String];

    // --- Side economy -------------------------------------------------------
    fn side_cash(&self, side: Side) -> i32;
    fn set_side_cash(&mut self, side: Side, amount: i32);
}

/// A minimal, do-nothing `WorldView` for unit tests elsewhere in the crate
/// that only need to satisfy the trait object, not observe its calls.
#[cfg(test)]
pub mod tests_support {
    use super::*;

    #[derive(Default)]
    pub struct NullWorld {
        pub metadata: MapMetadata,
        pub unit_types: Vec<String>,
        pub building_types: Vec<String>,
    }

    impl WorldView for NullWorld {
        fn live_units_of(&self, _side: Side) -> Vec<EntityId> {
            Vec::new()
        }
        fn live_buildings_of(&self, _side: Side) -> Vec<EntityId> {
            Vec::new()
        }
        fn position(&self, _eid: EntityId) -> Option<Pos> {
            None
        }
        fn owner(&self, _eid: EntityId) -> Option<Side> {
            None
        }
        fn health(&self, _eid: EntityId) -> i32 {
            0
        }
        fn max_health(&self, _eid: EntityId) -> i32 {
            0
        }
        fn type_name(&self, _eid: EntityId) -> Option<String> {
            None
        }
        fn has_active_move(&self, _eid: EntityId) -> bool {
            false
        }
        fn spawn_unit(&mut self, _type_name: &str, _owner: Side, _pos: Pos) -> EntityId {
            NO_ENTITY
        }
        fn spawn_building(&mut self, _type_name: &str, _owner: Side, _pos: Pos) -> EntityId {
            NO_ENTITY
        }
        fn set_health(&mut self, _eid: EntityId, _health: i32) {}
        fn set_owner(&mut self, _eid: EntityId, _side: Side) {}
        fn morph_object(&mut self, _eid: EntityId, _type_name: &str, _owner: Side) {}
        fn issue_move(&mut self, _eid: EntityId, _pos: Pos) {}
        fn clear_move(&mut self, _eid: EntityId) {}
        fn set_attack_move(&mut self, _eids: &[EntityId]) {}
        fn kill_entity(&mut self, _eid: EntityId) {}
        fn deploy(&mut self, _eid: EntityId) {}
        fn undeploy(&mut self, _eid: EntityId) {}
        fn sell_building(&mut self, _eid: EntityId) {}
        fn reveal_area(&mut self, _pos: Pos, _radius: f32) {}
        fn cover_area(&mut self, _pos: Pos, _radius: f32) {}
        fn reveal_all(&mut self) {}
        fn set_radar_force_enabled(&mut self, _enabled: bool) {}
        fn radar_pulse(&mut self, _pos: Pos) {}
        fn pan_camera_to(&mut self, _pos: Pos) {}
        fn play_sfx(&mut self, _sfx_id: &str) {}
        fn push_notification(&mut self, _text: &str, _category: NotificationCategory) {}
        fn set_mission_outcome(&mut self, _victory: bool) {}
        fn campaign_string(&self, _id: i32) -> Option<String> {
            None
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
        fn side_cash(&self, _side: Side) -> i32 {
            0
        }
        fn set_side_cash(&mut self, _side: Side, _amount: i32) {}
    }
}
