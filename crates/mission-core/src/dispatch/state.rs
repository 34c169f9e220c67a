//! Dispatch runtime state (§3.5): everything the host-dispatch handlers
//! thread between calls above and beyond the entity world and variable
//! slots, all of it carried across save/restore as part of the mission
//! save state (§4.G, §6.4 `dispatchState`).

use std::collections::{HashMap, HashSet};

use mission_rng::Rng;
use serde::{Deserialize, Serialize};

use crate::sides::SideTable;
use crate::world::{EntityId, Pos, Side};

/// One active air-strike row (§4.E group 15): the unit set `AirStrike`
/// spawned, keyed by the script's own `strikeId`, plus the point they
/// were sent to attack-move toward. `AirStrikeDone` reads `unit_ids`
/// against the world to decide if the strike has finished.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirStrikeRecord {
    pub strike_id: i32,
    pub unit_ids: Vec<EntityId>,
    pub target: Pos,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CameraSpin {
    pub active: bool,
    pub speed: i32,
    pub dir: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CameraSnapshot {
    pub x: f32,
    pub z: f32,
    pub zoom: f32,
    pub rotation: f32,
}

/// One camera's scripted state — the main viewport or the PIP viewport,
/// both governed by an identical set of operations (§4.E group 11).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraState {
    pub track_eid: Option<EntityId>,
    pub pos: Pos,
    pub zoom: f32,
    pub spin: CameraSpin,
    pub stored: Option<CameraSnapshot>,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            track_eid: None,
            pos: Pos::ZERO,
            zoom: 1.0,
            spin: CameraSpin::default(),
            stored: None,
        }
    }
}

/// A crate dropped by `NewCrate*` (§4.E group 16), pending pickup by the
/// host's effects manager. The VM only tracks identity and kind; pickup
/// resolution belongs to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrateKind {
    Unit,
    Bomb,
    Stealth,
    Cash,
    Shroud,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrateRecord {
    pub crate_id: i32,
    pub pos: Pos,
    pub kind: CrateKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchState {
    pub rng: Rng,
    pub sides: SideTable,
    pub tick_count: u64,

    pub air_strikes: Vec<AirStrikeRecord>,

    /// `GetUnusedBasePoint` indices already handed out this mission, so
    /// repeated calls walk the map's base spawn points without repeats.
    pub used_base_points: HashSet<usize>,

    pub side_colors: HashMap<Side, i32>,
    pub threat_levels: HashMap<String, i32>,

    pub main_camera: CameraState,
    pub pip_camera: CameraState,

    /// Canonical "side base position" fallback for `GetSidePosition`
    /// before any unit of that side exists (§4.E group 3).
    pub side_base_positions: HashMap<Side, Pos>,

    pub crates: Vec<CrateRecord>,
    pub next_crate_id: i32,

    pub ui_enabled: bool,
    pub game_frozen: bool,
    pub radar_force_enabled: bool,
    pub mission_outcome: Option<bool>,
}

impl DispatchState {
    pub fn new(seed: u32) -> Self {
        Self {
            rng: Rng::new(seed),
            sides: SideTable::default(),
            tick_count: 0,
            air_strikes: Vec::new(),
            used_base_points: HashSet::new(),
            side_colors: HashMap::new(),
            threat_levels: HashMap::new(),
            main_camera: CameraState::default(),
            pip_camera: CameraState::default(),
            side_base_positions: HashMap::new(),
            crates: Vec::new(),
            next_crate_id: 0,
            ui_enabled: true,
            game_frozen: false,
            radar_force_enabled: false,
            mission_outcome: None,
        }
    }

    pub fn tick(&mut self, current_tick: u64) {
        self.tick_count = current_tick;
    }

    pub fn camera_mut(&mut self, pip: bool) -> &mut CameraState {
        if pip {
            &mut self.pip_camera
        } else {
            &mut self.main_camera
        }
    }

    pub fn camera(&self, pip: bool) -> &CameraState {
        if pip {
            &self.pip_camera
        } else {
            &self.main_camera
        }
    }
}

impl Default for DispatchState {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_records_current_tick_verbatim() {
        let mut state = DispatchState::new(1);
        state.tick(7);
        assert_eq!(state.tick_count, 7);
    }

    #[test]
    fn main_and_pip_cameras_are_independent() {
        let mut state = DispatchState::new(1);
        state.camera_mut(false).spin.active = true;
        assert!(state.camera(false).spin.active);
        assert!(!state.camera(true).spin.active);
    }
}
