//! The declarative JSON mission runner (§4.F): a trigger/action rule
//! engine that drives the same `WorldView`/`DispatchState` surface as the
//! `.tok` interpreter, sharing its save-state shape (§4.G, §6.4) so a
//! save produced by either runner restores cleanly through the other.
//!
//! Unlike the `.tok` side, rules are data, not bytecode: a `MissionScript`
//! is parsed once from JSON and never recompiled; only its runtime state
//! (`RuleRuntime`) changes tick to tick.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::dispatch::state::{CrateKind, CrateRecord, DispatchState};
use crate::events::{EventLog, Fact};
use crate::world::{EntityId, NotificationCategory, Pos, Side, WorldView};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub center: Pos,
    pub radius: f32,
}

impl Area {
    pub fn contains(&self, pos: Pos) -> bool {
        self.center.distance(pos) <= self.radius
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Cmp {
    Eq,
    Ne,
    Ge,
    Le,
    Gt,
    Lt,
}

impl Cmp {
    fn apply(self, lhs: i32, rhs: i32) -> bool {
        match self {
            Cmp::Eq => lhs == rhs,
            Cmp::Ne => lhs != rhs,
            Cmp::Ge => lhs >= rhs,
            Cmp::Le => lhs <= rhs,
            Cmp::Gt => lhs > rhs,
            Cmp::Lt => lhs < rhs,
        }
    }
}

/// Victory condition carried by the mission header (§6.3); `SetVictoryCondition`
/// can replace it mid-mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum VictoryCondition {
    Survive,
    DestroyAllEnemies,
    HoldArea(Area),
    Custom,
}

/// A named group of entities, either spawned directly by the runner or
/// matched against entities that already exist in the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EntityGroupDef {
    Spawn {
        name: String,
        owner: Side,
        type_name: String,
        count: u32,
        pos: Pos,
    },
    Match {
        name: String,
        owner: Side,
        type_name: Option<String>,
        near: Option<Area>,
    },
}

impl EntityGroupDef {
    pub fn name(&self) -> &str {
        match self {
            EntityGroupDef::Spawn { name, .. } => name,
            EntityGroupDef::Match { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Trigger {
    Timer {
        tick: u64,
    },
    TimerRepeat {
        interval: u64,
        #[serde(default)]
        start: Option<u64>,
        #[serde(default)]
        limit: Option<u32>,
    },
    /// Named host events, mapped onto `Fact`s (§4.H event subscription
    /// list: `unitDied`, `unitAttacked`, `buildingCompleted`). `filter` is
    /// an optional type name, checked only for `buildingCompleted`.
    Event {
        name: String,
        #[serde(default)]
        filter: Option<String>,
    },
    GroupDefeated {
        group: String,
    },
    GroupReachedArea {
        group: String,
        area: Area,
    },
    UnitCount {
        owner: Side,
        #[serde(default)]
        type_name: Option<String>,
        op: Cmp,
        value: i32,
    },
    BuildingCount {
        owner: Side,
        #[serde(default)]
        type_name: Option<String>,
        op: Cmp,
        value: i32,
    },
    Flag {
        name: String,
        #[serde(default)]
        value: Option<bool>,
    },
    And(Vec<Trigger>),
    Or(Vec<Trigger>),
    Not(Box<Trigger>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CrateActionKind {
    Unit,
    Bomb,
    Stealth,
    Cash,
    Shroud,
}

impl From<CrateActionKind> for CrateKind {
    fn from(kind: CrateActionKind) -> CrateKind {
        match kind {
            CrateActionKind::Unit => CrateKind::Unit,
            CrateActionKind::Bomb => CrateKind::Bomb,
            CrateActionKind::Stealth => CrateKind::Stealth,
            CrateActionKind::Cash => CrateKind::Cash,
            CrateActionKind::Shroud => CrateKind::Shroud,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Action {
    SpawnGroup { group: String },
    MoveGroup { group: String, pos: Pos },
    AttackMoveGroup { group: String, pos: Pos },
    ShowDialog { text: String },
    SetObjective { text: String },
    GrantCredits { owner: Side, amount: i32 },
    RevealArea { area: Area },
    SetFlag { name: String, value: bool },
    DeclareVictory,
    DeclareDefeat,
    SetVictoryCondition { condition: VictoryCondition },
    PlaySound { sfx: String },
    PanCamera { pos: Pos },
    SpawnCrate { kind: CrateActionKind, pos: Pos },
    DamageGroup { group: String, amount: i32 },
    ChangeOwner { group: String, owner: Side },
    /// Spawns `count` units of `type_name` at the `map_edge`-th entrance in
    /// map metadata, adding them to `group_name` (created if absent).
    DropReinforcements {
        group_name: String,
        type_name: String,
        count: u32,
        owner: Side,
        map_edge: usize,
    },
    SetRuleEnabled { rule_id: String, enabled: bool },
    AddMessage { text: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptRule {
    pub id: String,
    pub trigger: Trigger,
    pub actions: Vec<Action>,
    #[serde(default = "default_true")]
    pub once: bool,
    #[serde(default)]
    pub delay: u64,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// `MissionScript = {id, name, victoryCondition, victoryTicks?,
/// objectiveLabel, startingCredits?, entityGroups[], rules[], flags?}`
/// (§6.3). The schema is version-free: unknown JSON fields are tolerated
/// by `serde`'s default "ignore unknown fields" behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionScript {
    pub id: String,
    pub name: String,
    pub victory_condition: VictoryCondition,
    #[serde(default)]
    pub victory_ticks: Option<u64>,
    pub objective_label: String,
    #[serde(default)]
    pub starting_credits: Option<i32>,
    #[serde(default)]
    pub entity_groups: Vec<EntityGroupDef>,
    #[serde(default)]
    pub rules: Vec<ScriptRule>,
    #[serde(default)]
    pub flags: HashMap<String, bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingDelayed {
    pub rule_id: String,
    pub execute_tick: u64,
}

/// Runtime state for one loaded `MissionScript` (§4.G: the portion of
/// `MissionSaveState` this runner owns). The script definition itself is
/// immutable after `load` and is not part of the serialized state — hosts
/// re-supply the same JSON on restore, the way the `.tok` side re-supplies
/// the same bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleRuntime {
    pub fired_rule_ids: HashSet<String>,
    pub flags: HashMap<String, bool>,
    pub group_entities: HashMap<String, Vec<EntityId>>,
    pub disabled_rules: HashSet<String>,
    pub repeat_counts: HashMap<String, u32>,
    pub pending_delayed: Vec<PendingDelayed>,
}

impl RuleRuntime {
    fn from_script(script: &MissionScript) -> Self {
        let disabled_rules = script
            .rules
            .iter()
            .filter(|r| !r.enabled)
            .map(|r| r.id.clone())
            .collect();
        Self {
            fired_rule_ids: HashSet::new(),
            flags: script.flags.clone(),
            group_entities: HashMap::new(),
            disabled_rules,
            repeat_counts: HashMap::new(),
            pending_delayed: Vec::new(),
        }
    }
}

/// Ties a `MissionScript` to its `RuleRuntime` and runs it tick by tick
/// (§4.F "Evaluation per tick").
pub struct RuleRunner {
    script: MissionScript,
    runtime: RuleRuntime,
}

impl RuleRunner {
    pub fn load(script: MissionScript) -> Self {
        let runtime = RuleRuntime::from_script(&script);
        Self { script, runtime }
    }

    /// Re-initializes runtime state while keeping the loaded script,
    /// mirroring the `.tok` side's `Mission::reset` (§4.G "Re-init
    /// hygiene").
    pub fn reset(&mut self) {
        self.runtime = RuleRuntime::from_script(&self.script);
    }

    pub fn script(&self) -> &MissionScript {
        &self.script
    }

    pub fn runtime(&self) -> &RuleRuntime {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut RuleRuntime {
        &mut self.runtime
    }

    pub fn set_runtime(&mut self, runtime: RuleRuntime) {
        self.runtime = runtime;
    }

    fn group_members(&self, group: &str) -> &[EntityId] {
        self.runtime
            .group_entities
            .get(group)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn spawn_group(&mut self, world: &mut dyn WorldView, group: &str) {
        let Some(def) = self
            .script
            .entity_groups
            .iter()
            .find(|g| g.name() == group)
        else {
            return;
        };
        let entities = match def {
            EntityGroupDef::Spawn {
                owner,
                type_name,
                count,
                pos,
                ..
            } => {
                let is_building = world.building_type_names().iter().any(|n| n == type_name);
                (0..*count)
                    .map(|_| {
                        if is_building {
                            world.spawn_building(type_name, *owner, *pos)
                        } else {
                            world.spawn_unit(type_name, *owner, *pos)
                        }
                    })
                    .collect()
            }
            EntityGroupDef::Match {
                owner,
                type_name,
                near,
                ..
            } => {
                let mut candidates = world.live_units_of(*owner);
                candidates.extend(world.live_buildings_of(*owner));
                candidates
                    .into_iter()
                    .filter(|&eid| {
                        type_name
                            .as_ref()
                            .is_none_or(|want| world.type_name(eid).as_deref() == Some(want))
                    })
                    .filter(|&eid| {
                        near.is_none_or(|area| {
                            world.position(eid).is_some_and(|p| area.contains(p))
                        })
                    })
                    .collect()
            }
        };
        self.runtime
            .group_entities
            .insert(group.to_string(), entities);
    }

    fn eval_trigger(
        &self,
        trigger: &Trigger,
        current_tick: u64,
        world: &dyn WorldView,
        events: &EventLog,
    ) -> bool {
        match trigger {
            Trigger::Timer { tick } => current_tick == *tick,
            Trigger::TimerRepeat {
                interval,
                start,
                limit,
            } => {
                if *interval == 0 {
                    return false;
                }
                let start = start.unwrap_or(0);
                if current_tick < start {
                    return false;
                }
                let elapsed = current_tick - start;
                if elapsed % interval != 0 {
                    return false;
                }
                match limit {
                    Some(limit) => (elapsed / interval) < *limit as u64,
                    None => true,
                }
            }
            Trigger::Event { name, filter } => match name.as_str() {
                "unitDied" => events.any(|f| matches!(f, Fact::Destroyed { .. })),
                "unitAttacked" => events.any(|f| {
                    matches!(f, Fact::SideAttacksSide { .. } | Fact::ObjectAttacksSide { .. })
                }),
                "buildingCompleted" => events.any(|f| match (f, filter) {
                    (Fact::TypeConstructed { type_name, .. }, Some(want)) => type_name == want,
                    (Fact::Constructed { .. } | Fact::TypeConstructed { .. }, None) => true,
                    _ => false,
                }),
                _ => false,
            },
            Trigger::GroupDefeated { group } => {
                let members = self.group_members(group);
                !members.is_empty() && members.iter().all(|&eid| world.health(eid) <= 0)
            }
            Trigger::GroupReachedArea { group, area } => self
                .group_members(group)
                .iter()
                .any(|&eid| world.position(eid).is_some_and(|p| area.contains(p))),
            Trigger::UnitCount {
                owner,
                type_name,
                op,
                value,
            } => {
                let count = world
                    .live_units_of(*owner)
                    .into_iter()
                    .filter(|&eid| {
                        type_name
                            .as_ref()
                            .is_none_or(|want| world.type_name(eid).as_deref() == Some(want))
                    })
                    .count() as i32;
                op.apply(count, *value)
            }
            Trigger::BuildingCount {
                owner,
                type_name,
                op,
                value,
            } => {
                let count = world
                    .live_buildings_of(*owner)
                    .into_iter()
                    .filter(|&eid| {
                        type_name
                            .as_ref()
                            .is_none_or(|want| world.type_name(eid).as_deref() == Some(want))
                    })
                    .count() as i32;
                op.apply(count, *value)
            }
            Trigger::Flag { name, value } => {
                let want = value.unwrap_or(true);
                self.runtime.flags.get(name).copied().unwrap_or(false) == want
            }
            Trigger::And(triggers) => triggers
                .iter()
                .all(|t| self.eval_trigger(t, current_tick, world, events)),
            Trigger::Or(triggers) => triggers
                .iter()
                .any(|t| self.eval_trigger(t, current_tick, world, events)),
            Trigger::Not(inner) => !self.eval_trigger(inner, current_tick, world, events),
        }
    }

    fn run_action(
        &mut self,
        action: &Action,
        world: &mut dyn WorldView,
        dispatch: &mut DispatchState,
    ) {
        match action {
            Action::SpawnGroup { group } => self.spawn_group(world, group),
            Action::MoveGroup { group, pos } => {
                for &eid in self.group_members(group).to_vec().iter() {
                    world.issue_move(eid, *pos);
                }
            }
            Action::AttackMoveGroup { group, pos } => {
                let members = self.group_members(group).to_vec();
                world.set_attack_move(&members);
                for &eid in &members {
                    world.issue_move(eid, *pos);
                }
            }
            Action::ShowDialog { text } => {
                world.push_notification(text, NotificationCategory::Message)
            }
            Action::SetObjective { text } => {
                world.push_notification(text, NotificationCategory::Message)
            }
            Action::GrantCredits { owner, amount } => {
                let current = world.side_cash(*owner);
                world.set_side_cash(*owner, current + amount);
            }
            Action::RevealArea { area } => world.reveal_area(area.center, area.radius),
            Action::SetFlag { name, value } => {
                self.runtime.flags.insert(name.clone(), *value);
            }
            Action::DeclareVictory => {
                dispatch.mission_outcome = Some(true);
                world.set_mission_outcome(true);
            }
            Action::DeclareDefeat => {
                dispatch.mission_outcome = Some(false);
                world.set_mission_outcome(false);
            }
            Action::SetVictoryCondition { condition } => {
                self.script.victory_condition = condition.clone();
            }
            Action::PlaySound { sfx } => world.play_sfx(sfx),
            Action::PanCamera { pos } => world.pan_camera_to(*pos),
            Action::SpawnCrate { kind, pos } => {
                let crate_id = dispatch.next_crate_id;
                dispatch.next_crate_id += 1;
                dispatch.crates.push(CrateRecord {
                    crate_id,
                    pos: *pos,
                    kind: (*kind).into(),
                });
            }
            Action::DamageGroup { group, amount } => {
                for &eid in self.group_members(group).to_vec().iter() {
                    let remaining = (world.health(eid) - amount).max(0);
                    world.set_health(eid, remaining);
                }
            }
            Action::ChangeOwner { group, owner } => {
                for &eid in self.group_members(group).to_vec().iter() {
                    world.set_owner(eid, *owner);
                }
            }
            Action::DropReinforcements {
                group_name,
                type_name,
                count,
                owner,
                map_edge,
            } => {
                let pos = world
                    .map_metadata()
                    .entrances
                    .get(*map_edge)
                    .map(|e| Pos {
                        x: e.tile_x as f32 * crate::world::TILE_SIZE,
                        z: e.tile_z as f32 * crate::world::TILE_SIZE,
                    })
                    .unwrap_or(Pos::ZERO);
                let is_building = world.building_type_names().iter().any(|n| n == type_name);
                let spawned: Vec<EntityId> = (0..*count)
                    .map(|_| {
                        if is_building {
                            world.spawn_building(type_name, *owner, pos)
                        } else {
                            world.spawn_unit(type_name, *owner, pos)
                        }
                    })
                    .collect();
                self.runtime
                    .group_entities
                    .entry(group_name.clone())
                    .or_default()
                    .extend(spawned);
            }
            Action::SetRuleEnabled { rule_id, enabled } => {
                if *enabled {
                    self.runtime.disabled_rules.remove(rule_id);
                } else {
                    self.runtime.disabled_rules.insert(rule_id.clone());
                }
            }
            Action::AddMessage { text } => {
                world.push_notification(text, NotificationCategory::Message)
            }
        }
    }

    /// Runs one tick of rule evaluation (§4.F "Evaluation per tick"):
    /// newly-true triggers fire (immediately or queued by `delay`), then
    /// due delayed actions run in queue order.
    pub fn tick(
        &mut self,
        current_tick: u64,
        world: &mut dyn WorldView,
        dispatch: &mut DispatchState,
        events: &EventLog,
    ) {
        let rule_ids: Vec<String> = self.script.rules.iter().map(|r| r.id.clone()).collect();
        for rule_id in rule_ids {
            if self.runtime.disabled_rules.contains(&rule_id) {
                continue;
            }
            let rule = self
                .script
                .rules
                .iter()
                .find(|r| r.id == rule_id)
                .expect("rule_id drawn from script.rules");
            if rule.once && self.runtime.fired_rule_ids.contains(&rule_id) {
                continue;
            }
            if !self.eval_trigger(&rule.trigger, current_tick, world, events) {
                continue;
            }
            self.runtime.fired_rule_ids.insert(rule_id.clone());
            *self.runtime.repeat_counts.entry(rule_id.clone()).or_insert(0) += 1;
            if rule.delay > 0 {
                self.runtime.pending_delayed.push(PendingDelayed {
                    rule_id: rule_id.clone(),
                    execute_tick: current_tick + rule.delay,
                });
            } else {
                let actions = rule.actions.clone();
                for action in &actions {
                    self.run_action(action, world, dispatch);
                }
            }
        }

        let due: Vec<String> = self
            .runtime
            .pending_delayed
            .iter()
            .filter(|p| p.execute_tick <= current_tick)
            .map(|p| p.rule_id.clone())
            .collect();
        self.runtime
            .pending_delayed
            .retain(|p| p.execute_tick > current_tick);
        for rule_id in due {
            let Some(actions) = self
                .script
                .rules
                .iter()
                .find(|r| r.id == rule_id)
                .map(|r| r.actions.clone())
            else {
                continue;
            };
            for action in &actions {
                self.run_action(action, world, dispatch);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::tests_support::NullWorld;

    fn cash_script() -> MissionScript {
        MissionScript {
            id: "m1".into(),
            name: "test".into(),
            victory_condition: VictoryCondition::Survive,
            victory_ticks: None,
            objective_label: "Survive".into(),
            starting_credits: None,
            entity_groups: vec![],
            rules: vec![ScriptRule {
                id: "grant".into(),
                trigger: Trigger::Timer { tick: 0 },
                actions: vec![Action::GrantCredits {
                    owner: 0,
                    amount: 500,
                }],
                once: true,
                delay: 0,
                enabled: true,
            }],
            flags: HashMap::new(),
        }
    }

    #[test]
    fn once_rule_fires_exactly_once() {
        let mut runner = RuleRunner::load(cash_script());
        let mut world = NullWorld::default();
        let mut dispatch = DispatchState::new(1);
        let events = EventLog::default();
        runner.tick(0, &mut world, &mut dispatch, &events);
        runner.tick(1, &mut world, &mut dispatch, &events);
        assert_eq!(world.side_cash(0), 500);
    }

    #[test]
    fn delayed_action_waits_for_its_execute_tick() {
        let mut script = cash_script();
        script.rules[0].delay = 3;
        let mut runner = RuleRunner::load(script);
        let mut world = NullWorld::default();
        let mut dispatch = DispatchState::new(1);
        let events = EventLog::default();
        runner.tick(0, &mut world, &mut dispatch, &events);
        assert_eq!(world.side_cash(0), 0);
        runner.tick(1, &mut world, &mut dispatch, &events);
        runner.tick(2, &mut world, &mut dispatch, &events);
        assert_eq!(world.side_cash(0), 0);
        runner.tick(3, &mut world, &mut dispatch, &events);
        assert_eq!(world.side_cash(0), 500);
    }

    #[test]
    fn flag_trigger_reads_runtime_flags_not_script_defaults() {
        let mut script = cash_script();
        script.rules[0].trigger = Trigger::Flag {
            name: "go".into(),
            value: Some(true),
        };
        let mut runner = RuleRunner::load(script);
        let mut world = NullWorld::default();
        let mut dispatch = DispatchState::new(1);
        let events = EventLog::default();
        runner.tick(0, &mut world, &mut dispatch, &events);
        assert_eq!(world.side_cash(0), 0);
        runner.runtime_mut().flags.insert("go".into(), true);
        runner.tick(1, &mut world, &mut dispatch, &events);
        assert_eq!(world.side_cash(0), 500);
    }

    #[test]
    fn group_defeated_requires_a_nonempty_group() {
        let script = MissionScript {
            id: "m2".into(),
            name: "t".into(),
            victory_condition: VictoryCondition::Survive,
            victory_ticks: None,
            objective_label: "x".into(),
            starting_credits: None,
            entity_groups: vec![],
            rules: vec![],
            flags: HashMap::new(),
        };
        let runner = RuleRunner::load(script);
        let world = NullWorld::default();
        let events = EventLog::default();
        assert!(!runner.eval_trigger(
            &Trigger::GroupDefeated {
                group: "nope".into()
            },
            0,
            &world,
            &events
        ));
    }

    #[test]
    fn mission_schema_tolerates_unknown_fields() {
        let json = r#"{
            "id": "m3", "name": "t", "victoryCondition": {"kind": "survive"},
            "objectiveLabel": "x", "entityGroups": [], "rules": [],
            "someFutureField": 42
        }"#;
        let script: MissionScript = serde_json::from_str(json).unwrap();
        assert_eq!(script.id, "m3");
    }
}
