//! End-to-end combat scenarios driven through the public API.

use std::collections::HashSet;

use hecs::{Entity, World};
use strum::IntoEnumIterator;

use rpg_runtime::actions::{Action, ActionQueue, AttackAction};
use rpg_runtime::combat::timers::StateTimers;
use rpg_runtime::combat::{AttackResultType, Combat, CombatConfig};
use rpg_runtime::components::{CombatState, Health, ObjectId, Position};
use rpg_runtime::events::{EventQueue, GameEvent};
use rpg_runtime::faction::{Faction, HostilityMatrix, HostilityRules};
use rpg_runtime::party::Party;
use rpg_runtime::scenario::ScenarioConfig;
use rpg_runtime::spawning::{templates, CreatureDef};
use rpg_runtime::systems::effects::{DamageEffect, DamageType};

struct Harness {
    world: World,
    combat: Combat,
    party: Party,
    events: EventQueue,
    next_id: u32,
}

impl Harness {
    fn new() -> Self {
        let config = CombatConfig {
            random_seed: Some(42),
            ..CombatConfig::default()
        };
        Self {
            world: World::new(),
            combat: Combat::new(config, HostilityMatrix::standard()).unwrap(),
            party: Party::new(),
            events: EventQueue::new(),
            next_id: 1,
        }
    }

    fn spawn(&mut self, def: CreatureDef) -> Entity {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        let entity = def.spawn(&mut self.world, id);
        if def.party {
            self.party.add_member(entity);
        }
        entity
    }

    fn update(&mut self, now: u32) {
        self.combat
            .update(&mut self.world, &self.party, now, &mut self.events);
    }

    fn state(&self, entity: Entity) -> CombatState {
        *self.world.get::<&CombatState>(entity).unwrap()
    }

    fn assert_roster_invariant(&self) {
        let roster: Vec<Entity> = self.combat.roster().collect();
        let unique: HashSet<Entity> = roster.iter().copied().collect();
        assert_eq!(roster.len(), unique.len(), "duplicate roster entry");
        assert_eq!(roster.len(), self.combat.roster_len());
        assert!(self.combat.roster_is_consistent());
    }
}

/// Queue an attack that is already in range and always hits for `damage`
fn queue_forced_attack(world: &mut World, attacker: Entity, target: Entity, damage: i32) {
    let mut attack =
        AttackAction::new(target, 2.0).with_outcome(AttackResultType::HitSuccessful, Some(damage));
    attack.in_range = true;
    world
        .get::<&mut ActionQueue>(attacker)
        .unwrap()
        .push(Action::Attack(attack));
}

#[test]
fn test_hostiles_near_leader_join_roster_once() {
    let mut h = Harness::new();
    let leader = h.spawn(templates::jedi("bastila"));
    let first = h.spawn(templates::dark_jedi("dark_jedi").at(6.0, 0.0, 0.0));
    let second = h.spawn(templates::sith_trooper("sith_trooper").at(-5.0, 8.0, 0.0));

    for frame in 0..20 {
        h.update(frame * 100);
        h.assert_roster_invariant();
    }

    assert!(h.combat.is_registered(first));
    assert!(h.combat.is_registered(second));
    assert!(h.combat.is_registered(leader));
    assert_eq!(h.combat.roster_len(), 3);

    let registered = h
        .events
        .iter()
        .filter(|e| matches!(e, GameEvent::CombatantRegistered { entity } if *entity == first))
        .count();
    assert_eq!(registered, 1);
}

#[test]
fn test_hostiles_out_of_detection_range_are_ignored() {
    let mut h = Harness::new();
    h.spawn(templates::jedi("bastila"));
    let far = h.spawn(templates::dark_jedi("dark_jedi").at(25.0, 0.0, 0.0));

    for frame in 0..5 {
        h.update(frame * 100);
    }

    assert!(!h.combat.is_registered(far));
    assert!(!h.combat.is_activated());
}

#[test]
fn test_attack_on_idle_target_duels_in_same_update() {
    let mut h = Harness::new();
    let target = h.spawn(templates::jedi("bastila"));
    let attacker = h.spawn(templates::dark_jedi("dark_jedi").at(1.0, 0.0, 0.0));
    h.combat.register_combatant(attacker);
    queue_forced_attack(&mut h.world, attacker, target, 5);

    h.update(0);

    assert_eq!(h.state(attacker), CombatState::Attack);
    assert_eq!(h.state(target), CombatState::Defense);
    assert!(h.events.iter().any(|e| matches!(
        e,
        GameEvent::AttackResolved { attacker: a, target: t, duel: true, .. }
            if *a == attacker && *t == target
    )));
    // Both sides animated by the end of the same update
    let animated: HashSet<Entity> = h
        .events
        .iter()
        .filter_map(|e| match e {
            GameEvent::PlayAnimation { entity, .. } => Some(*entity),
            _ => None,
        })
        .collect();
    assert!(animated.contains(&attacker) && animated.contains(&target));
}

#[test]
fn test_busy_target_is_bashed() {
    let mut h = Harness::new();
    let target = h.spawn(templates::jedi("bastila"));
    let attacker = h.spawn(templates::dark_jedi("dark_jedi").at(1.0, 0.0, 0.0));
    h.world.insert_one(target, CombatState::Attack).unwrap();
    // Target ahead of the attacker: the scan rotates it behind, so the
    // attacker swings while the target is still mid-attack
    h.combat.register_combatant(target);
    h.combat.register_combatant(attacker);
    queue_forced_attack(&mut h.world, attacker, target, 5);

    h.update(0);

    assert_eq!(h.state(attacker), CombatState::Attack);
    assert!(h.events.iter().any(|e| matches!(
        e,
        GameEvent::AttackResolved { duel: false, .. }
    )));
    assert_ne!(h.state(target), CombatState::Defense);
}

#[test]
fn test_attack_state_lasts_its_full_duration() {
    let mut h = Harness::new();
    let target = h.spawn(templates::jedi("bastila"));
    let attacker = h.spawn(templates::dark_jedi("dark_jedi").at(1.0, 0.0, 0.0));
    h.combat.register_combatant(attacker);
    queue_forced_attack(&mut h.world, attacker, target, 5);

    h.update(0);
    assert_eq!(h.state(attacker), CombatState::Attack);

    h.update(1499);
    assert_eq!(h.state(attacker), CombatState::Attack);
    assert_eq!(h.state(target), CombatState::Defense);
    // The delayed damage landed half a second in
    assert_eq!(h.world.get::<&Health>(target).unwrap().current, 55);

    // Exactly at the deadline both timers are still pending
    h.update(1500);
    assert_eq!(h.state(attacker), CombatState::Attack);
    assert_eq!(h.state(target), CombatState::Defense);

    // Timers fire strictly after their deadline
    h.update(1501);
    assert_eq!(h.state(attacker), CombatState::Cooldown);
    assert_eq!(h.state(target), CombatState::Idle);

    h.update(3002);
    assert_eq!(h.state(attacker), CombatState::Idle);
}

#[test]
fn test_actor_without_hostiles_deactivates_after_delay() {
    let mut h = Harness::new();
    let leader = h.spawn(templates::jedi("bastila"));
    let hostile = h.spawn(templates::dark_jedi("dark_jedi").at(5.0, 0.0, 0.0));

    h.update(0);
    h.update(100);
    assert!(h.combat.is_registered(leader));
    assert!(h.combat.is_registered(hostile));

    h.world.despawn(hostile).unwrap();

    // Deactivation armed at 200, expires strictly after 2700
    let mut now = 200;
    while now <= 2700 {
        h.update(now);
        assert!(h.combat.is_registered(leader), "left roster early at {}", now);
        now += 100;
    }

    h.update(2800);
    assert!(!h.combat.is_registered(leader));
    assert_eq!(h.state(leader), CombatState::Idle);
    assert!(h
        .events
        .iter()
        .any(|e| matches!(e, GameEvent::CombatantDeactivated { entity } if *entity == leader)));

    // The destroyed hostile is dropped from the front next frame
    h.update(2900);
    assert_eq!(h.combat.roster_len(), 0);
    assert!(!h.combat.is_activated());
}

#[test]
fn test_hostile_returning_cancels_deactivation() {
    let mut h = Harness::new();
    let leader = h.spawn(templates::jedi("bastila"));
    let hostile = h.spawn(templates::dark_jedi("dark_jedi").at(5.0, 0.0, 0.0));
    h.update(0);
    h.update(100);

    // Wander off, then come back before the delay runs out
    h.world
        .get::<&mut Position>(hostile)
        .unwrap()
        .0
        .x = 40.0;
    for now in (200..=1000).step_by(100) {
        h.update(now);
    }
    h.world
        .get::<&mut Position>(hostile)
        .unwrap()
        .0
        .x = 5.0;
    for now in (1100..=4000).step_by(100) {
        h.update(now);
    }

    assert!(h.combat.is_registered(leader));
    assert!(h.combat.is_registered(hostile));
}

#[test]
fn test_delayed_effect_on_destroyed_target_is_dropped() {
    let mut h = Harness::new();
    let target = h.spawn(templates::kinrath("kinrath"));
    h.combat
        .schedule_effect(target, DamageEffect::new(10, DamageType::Slashing, None));
    h.world.despawn(target).unwrap();

    h.update(0);
    h.update(600);

    assert_eq!(h.combat.effects_applied(), 0);
    assert_eq!(h.combat.effects_dropped(), 1);
    assert_eq!(h.combat.pending_effects(), 0);
}

#[test]
fn test_attacker_destroyed_mid_swing() {
    let mut h = Harness::new();
    let target = h.spawn(templates::jedi("bastila"));
    let attacker = h.spawn(templates::dark_jedi("dark_jedi").at(1.0, 0.0, 0.0));
    h.combat.register_combatant(attacker);
    queue_forced_attack(&mut h.world, attacker, target, 5);
    h.update(0);

    h.world.despawn(attacker).unwrap();
    for now in (100..=4000).step_by(100) {
        h.update(now);
        h.assert_roster_invariant();
    }

    // The damage still lands; the attacker just stops existing
    assert_eq!(h.world.get::<&Health>(target).unwrap().current, 55);
    assert!(!h.combat.is_registered(attacker));
}

#[test]
fn test_rearmed_state_timer_stays_busy_until_both_fire() {
    let mut world = World::new();
    let e = world.spawn(());
    let mut timers = StateTimers::default();

    timers.update(0);
    timers.arm(e, 1500);
    timers.update(100);
    timers.arm(e, 1500);
    assert_eq!(timers.pending(e), 2);

    timers.update(1501);
    assert!(timers.is_busy(e));
    timers.update(1601);
    assert!(!timers.is_busy(e));
}

#[test]
fn test_hostility_is_symmetric_and_deterministic() {
    let matrix = HostilityMatrix::standard();
    let rebuilt = HostilityMatrix::build(&HostilityRules::standard());
    assert_eq!(*matrix, rebuilt);

    for a in Faction::iter() {
        for b in Faction::iter() {
            assert_eq!(
                matrix.is_hostile(a, b),
                matrix.is_hostile(b, a),
                "{:?} vs {:?}",
                a,
                b
            );
        }
    }
}

#[test]
fn test_default_skirmish_runs() {
    let scenario = ScenarioConfig {
        combat: CombatConfig {
            random_seed: Some(7),
            ..CombatConfig::default()
        },
        ..ScenarioConfig::default()
    };
    let mut area = scenario.build_area().unwrap();

    let mut attacks = 0;
    let mut damage_events = 0;
    for frame in 0..600 {
        area.update(frame * 50);
        for event in area.events.drain() {
            match event {
                GameEvent::AttackResolved { .. } => attacks += 1,
                GameEvent::DamageApplied { .. } => damage_events += 1,
                _ => {}
            }
        }
        assert!(area.combat.roster_is_consistent());
    }

    assert!(attacks > 0);
    assert!(damage_events > 0);
    assert!(area.combat.effects_applied() > 0);
}
