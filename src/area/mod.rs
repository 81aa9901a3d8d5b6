//! Area - one loaded level and everything living in it.
//!
//! The area owns the ECS world, the combat engine, the party and the event
//! queue, and bridges them to the level geometry: walkmesh elevation,
//! obstacle and line-of-sight tests, triggers and room visibility.

pub mod trigger;
pub mod visibility;
pub mod walkmesh;

use std::collections::HashMap;

use glam::{Vec2, Vec3};
use hecs::{Entity, World};

use crate::combat::{Combat, CombatConfig};
use crate::components::{
    Collision, Creature, CurrentRoom, Dead, Facing, HeartbeatScript, ObjectId, Position,
};
use crate::constants::{
    ticks_to_seconds, CREATURE_OBSTACLE_TEST_Z, ELEVATION_TEST_Z, HEARTBEAT_INTERVAL,
    LINE_OF_SIGHT_TEST_Z, MAX_DISTANCE_TO_TEST_TRIGGER,
};
use crate::error::CombatError;
use crate::events::{EventQueue, GameEvent};
use crate::faction::HostilityMatrix;
use crate::party::Party;
use crate::queries;
use crate::spawning::CreatureDef;
use crate::systems::actions::execute_actions;

use trigger::Trigger;
use visibility::{CameraMode, RoomVisibility};
use walkmesh::{raycast_sphere, Walkmesh};

/// Offsets tried when an object cannot be placed where it stands
const LANDING_OFFSETS: [Vec2; 4] = [
    Vec2::new(1.0, 0.0),
    Vec2::new(-1.0, 0.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(0.0, -1.0),
];

/// A loaded area
pub struct Area {
    pub name: String,

    /// The ECS world holding every object of the area
    pub world: World,

    /// Combat engine for this area
    pub combat: Combat,

    /// Player party; the leader drives visibility and module transitions
    pub party: Party,

    /// Events for the scene, audio and script runner
    pub events: EventQueue,

    pub walkmesh: Walkmesh,

    pub visibility: RoomVisibility,

    pub camera_mode: CameraMode,

    /// Script run on every heartbeat
    pub heartbeat_script: Option<String>,

    objects_by_id: HashMap<ObjectId, Entity>,
    next_object_id: u32,
    destroy_queue: Vec<Entity>,
    last_update: Option<u32>,
    last_heartbeat: Option<u32>,
}

impl Area {
    /// Create an empty area using the standard faction rules
    pub fn new(
        name: &str,
        config: CombatConfig,
        walkmesh: Walkmesh,
        visibility: RoomVisibility,
    ) -> Result<Self, CombatError> {
        let combat = Combat::new(config, HostilityMatrix::standard())?;

        Ok(Self {
            name: name.to_string(),
            world: World::new(),
            combat,
            party: Party::new(),
            events: EventQueue::new(),
            walkmesh,
            visibility,
            camera_mode: CameraMode::default(),
            heartbeat_script: None,
            objects_by_id: HashMap::new(),
            next_object_id: 1,
            destroy_queue: Vec::new(),
            last_update: None,
            last_heartbeat: None,
        })
    }

    // =========================================================================
    // FRAME
    // =========================================================================

    /// Run one frame at tick `now`
    pub fn update(&mut self, now: u32) {
        puffin::profile_function!();

        let dt = self
            .last_update
            .map(|last| ticks_to_seconds(now.saturating_sub(last)))
            .unwrap_or(0.0);
        self.last_update = Some(now);

        self.flush_destroyed();
        execute_actions(self, now, dt);
        self.update_visibility();
        self.combat
            .update(&mut self.world, &self.party, now, &mut self.events);
        self.update_heartbeat(now);
    }

    fn update_visibility(&mut self) {
        let leader_room = self
            .party
            .leader()
            .and_then(|leader| self.world.get::<&CurrentRoom>(leader).ok().map(|r| r.0))
            .and_then(|room| self.walkmesh.room_name(room));
        let rooms = self.walkmesh.rooms().iter().map(|r| r.name.as_str());
        self.visibility.update(rooms, leader_room, self.camera_mode);
    }

    fn update_heartbeat(&mut self, now: u32) {
        let Some(last) = self.last_heartbeat else {
            self.last_heartbeat = Some(now);
            return;
        };
        if now.saturating_sub(last) < HEARTBEAT_INTERVAL {
            return;
        }
        self.last_heartbeat = Some(now);

        if let Some(script) = &self.heartbeat_script {
            self.events.push(GameEvent::ScriptRequested {
                script: script.clone(),
                caller: None,
                triggerer: None,
            });
        }

        let mut scripted: Vec<(ObjectId, Entity, String)> = self
            .world
            .query::<(&HeartbeatScript, &ObjectId)>()
            .without::<&Dead>()
            .iter()
            .map(|(entity, (script, id))| (*id, entity, script.0.clone()))
            .collect();
        scripted.sort_by_key(|(id, _, _)| *id);

        for (_, entity, script) in scripted {
            self.events.push(GameEvent::ScriptRequested {
                script,
                caller: Some(entity),
                triggerer: None,
            });
        }
    }

    // =========================================================================
    // OBJECTS
    // =========================================================================

    /// Spawn a creature, index it and place it on the walkmesh
    pub fn spawn_creature(&mut self, def: &CreatureDef) -> Entity {
        let id = self.allocate_id();
        let entity = def.spawn(&mut self.world, id);
        self.objects_by_id.insert(id, entity);

        if def.party {
            self.party.add_member(entity);
        }
        if !self.land_object(entity) {
            tracing::trace!("{} spawned off the walkmesh", def.tag);
        }

        tracing::debug!("spawned {}", queries::describe(&self.world, entity));
        entity
    }

    /// Add a trigger at `position`
    pub fn add_trigger(&mut self, trigger: Trigger, position: Vec3) -> Entity {
        let id = self.allocate_id();
        let entity = self.world.spawn((id, Position(position), trigger));
        self.objects_by_id.insert(id, entity);
        entity
    }

    fn allocate_id(&mut self) -> ObjectId {
        let id = ObjectId(self.next_object_id);
        self.next_object_id += 1;
        id
    }

    pub fn object_by_id(&self, id: ObjectId) -> Option<Entity> {
        self.objects_by_id
            .get(&id)
            .copied()
            .filter(|e| self.world.contains(*e))
    }

    /// `nth` creature with the given tag, in spawn order
    pub fn object_by_tag(&self, tag: &str, nth: usize) -> Option<Entity> {
        queries::find_by_tag(&self.world, tag, nth)
    }

    /// Queue an object for removal at the start of the next update
    pub fn destroy_object(&mut self, entity: Entity) {
        if !self.destroy_queue.contains(&entity) {
            self.destroy_queue.push(entity);
        }
    }

    fn flush_destroyed(&mut self) {
        for entity in std::mem::take(&mut self.destroy_queue) {
            if !self.world.contains(entity) {
                continue;
            }
            tracing::debug!("destroying {}", queries::describe(&self.world, entity));

            if let Ok(id) = self.world.get::<&ObjectId>(entity).map(|id| *id) {
                self.objects_by_id.remove(&id);
            }
            self.party.remove_member(entity);
            self.combat.forget(entity);
            for (_, trigger) in self.world.query_mut::<&mut Trigger>() {
                trigger.remove_tenant(entity);
            }
            let _ = self.world.despawn(entity);
        }
    }

    // =========================================================================
    // GEOMETRY
    // =========================================================================

    /// Room and height of the walkable ground at `point`. A creature other
    /// than `except` standing there blocks it.
    pub fn elevation_at(&self, point: Vec2, except: Option<Entity>) -> Option<(usize, f32)> {
        let elevation = self.walkmesh.elevation_at(point)?;

        let origin = point.extend(ELEVATION_TEST_Z);
        let blocked = self
            .world
            .query::<(&Creature, &Position, &Collision)>()
            .without::<&Dead>()
            .iter()
            .filter(|(entity, _)| Some(*entity) != except)
            .any(|(_, (_, pos, collision))| {
                raycast_sphere(origin, Vec3::NEG_Z, pos.0, collision.radius).is_some()
            });

        (!blocked).then_some(elevation)
    }

    /// Nearest live creature between `entity` and `dest`
    pub fn find_creature_obstacle(&self, entity: Entity, dest: Vec3) -> Option<Entity> {
        let from = queries::position_of(&self.world, entity)? + Vec3::Z * CREATURE_OBSTACLE_TEST_Z;
        let to = dest + Vec3::Z * CREATURE_OBSTACLE_TEST_Z;
        let offset = to - from;
        let distance = offset.length();
        if distance <= f32::EPSILON {
            return None;
        }
        let dir = offset / distance;

        self.world
            .query::<(&Creature, &Position, &Collision)>()
            .without::<&Dead>()
            .iter()
            .filter(|(other, _)| *other != entity)
            .filter_map(|(other, (_, pos, collision))| {
                let hit = raycast_sphere(from, dir, pos.0, collision.radius)?;
                (hit <= distance).then_some((other, hit))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(other, _)| other)
    }

    /// No wall between the eyes of `a` and `b`
    pub fn has_line_of_sight(&self, a: Entity, b: Entity) -> bool {
        let (Some(from), Some(to)) = (
            queries::position_of(&self.world, a),
            queries::position_of(&self.world, b),
        ) else {
            return false;
        };
        let eyes = Vec3::Z * LINE_OF_SIGHT_TEST_Z;
        self.walkmesh
            .first_wall_between(from + eyes, to + eyes)
            .is_none()
    }

    /// Step `entity` toward `dest`. Returns `false` if the step was blocked.
    pub fn move_creature_towards(&mut self, entity: Entity, dest: Vec3, run: bool, dt: f32) -> bool {
        let Some(pos) = queries::position_of(&self.world, entity) else {
            return false;
        };
        let speed = match self.world.get::<&Creature>(entity) {
            Ok(creature) if run => creature.run_speed,
            Ok(creature) => creature.walk_speed,
            Err(_) => return false,
        };

        let offset = (dest - pos).truncate();
        let distance = offset.length();
        if distance <= f32::EPSILON {
            return true;
        }
        if let Some(facing) = Facing::towards(pos, dest) {
            let _ = self.world.insert_one(entity, facing);
        }

        let step = (speed * dt).min(distance);
        let next = pos.truncate() + offset / distance * step;

        if self
            .find_creature_obstacle(entity, next.extend(pos.z))
            .is_some()
        {
            return false;
        }
        let Some((room, z)) = self.elevation_at(next, Some(entity)) else {
            return false;
        };

        self.place(entity, next.extend(z), room);
        self.check_triggers_intersection(entity);
        true
    }

    /// Snap an object onto the walkmesh, trying nearby spots if needed
    pub fn land_object(&mut self, entity: Entity) -> bool {
        let Some(pos) = queries::position_of(&self.world, entity) else {
            return false;
        };
        let xy = pos.truncate();

        let spots = std::iter::once(xy).chain(LANDING_OFFSETS.iter().map(|o| xy + *o));
        for spot in spots {
            if let Some((room, z)) = self.elevation_at(spot, Some(entity)) {
                self.place(entity, spot.extend(z), room);
                return true;
            }
        }
        false
    }

    fn place(&mut self, entity: Entity, position: Vec3, room: usize) {
        if let Ok(mut pos) = self.world.get::<&mut Position>(entity) {
            pos.0 = position;
        }
        let _ = self.world.insert_one(entity, CurrentRoom(room));
    }

    // =========================================================================
    // TRIGGERS
    // =========================================================================

    /// Update trigger tenancy for `entity` after it moved
    pub fn check_triggers_intersection(&mut self, entity: Entity) {
        let Some(pos) = queries::position_of(&self.world, entity) else {
            return;
        };
        let is_leader = self.party.leader() == Some(entity);

        let mut requested = Vec::new();
        for (_, (trigger_pos, trigger)) in self.world.query_mut::<(&Position, &mut Trigger)>() {
            // Tenants are always re-tested so leaving a large trigger is noticed
            if !trigger.is_tenant(entity)
                && trigger_pos.0.distance(pos) > MAX_DISTANCE_TO_TEST_TRIGGER
            {
                continue;
            }

            if !trigger.contains(trigger_pos.0, pos.truncate()) {
                if trigger.remove_tenant(entity) {
                    if let Some(script) = &trigger.on_exit {
                        requested.push(GameEvent::ScriptRequested {
                            script: script.clone(),
                            caller: None,
                            triggerer: Some(entity),
                        });
                    }
                }
                continue;
            }
            if !trigger.add_tenant(entity) {
                continue;
            }

            tracing::debug!("{:?} entered trigger {}", entity, trigger.tag);
            if let (Some(module), true) = (&trigger.linked_to_module, is_leader) {
                requested.push(GameEvent::ModuleTransitionRequested {
                    module: module.clone(),
                    waypoint: trigger.linked_to.clone().unwrap_or_default(),
                });
            } else if let Some(script) = &trigger.on_enter {
                requested.push(GameEvent::ScriptRequested {
                    script: script.clone(),
                    caller: None,
                    triggerer: Some(entity),
                });
            }
        }

        for event in requested {
            self.events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawning::templates;
    use super::walkmesh::Room;

    fn area() -> Area {
        let config = CombatConfig {
            random_seed: Some(11),
            ..CombatConfig::default()
        };
        let walkmesh = Walkmesh::new(vec![
            Room::square_floor("room_a", Vec2::ZERO, 10.0, 0.0),
            Room::square_floor("room_b", Vec2::new(25.0, 0.0), 5.0, 2.0),
        ]);
        let visibility = RoomVisibility::from_pairs([("room_a", "room_b")]);
        Area::new("test_area", config, walkmesh, visibility).unwrap()
    }

    fn square(half: f32) -> Vec<Vec2> {
        vec![
            Vec2::new(-half, -half),
            Vec2::new(half, -half),
            Vec2::new(half, half),
            Vec2::new(-half, half),
        ]
    }

    #[test]
    fn test_spawn_lands_on_walkmesh() {
        let mut area = area();
        let def = templates::kinrath("kinrath").at(25.3, 0.2, 50.0);
        let entity = area.spawn_creature(&def);

        let pos = queries::position_of(&area.world, entity).unwrap();
        assert!((pos.z - 2.0).abs() < 1e-3);
        assert_eq!(area.world.get::<&CurrentRoom>(entity).unwrap().0, 1);
    }

    #[test]
    fn test_land_object_tries_offsets() {
        let mut area = area();
        // Just past the edge of room_a
        let def = templates::kinrath("kinrath").at(10.5, 0.3, 0.0);
        let entity = area.spawn_creature(&def);

        let pos = queries::position_of(&area.world, entity).unwrap();
        assert!((pos.x - 9.5).abs() < 1e-4);
    }

    #[test]
    fn test_object_index() {
        let mut area = area();
        let a = area.spawn_creature(&templates::kinrath("kinrath"));
        let b = area.spawn_creature(&templates::kinrath("kinrath").at(3.0, 0.0, 0.0));

        assert_eq!(area.object_by_id(ObjectId(1)), Some(a));
        assert_eq!(area.object_by_tag("kinrath", 1), Some(b));
        assert_eq!(area.object_by_tag("kinrath", 2), None);

        area.destroy_object(a);
        // Still there until the next update
        assert!(area.world.contains(a));
        area.update(0);
        assert!(!area.world.contains(a));
        assert_eq!(area.object_by_id(ObjectId(1)), None);
        assert_eq!(area.object_by_tag("kinrath", 0), Some(b));
    }

    #[test]
    fn test_destroying_party_member_updates_party() {
        let mut area = area();
        let jedi = area.spawn_creature(&templates::jedi("bastila"));
        assert_eq!(area.party.leader(), Some(jedi));

        area.destroy_object(jedi);
        area.update(0);
        assert!(area.party.is_empty());
    }

    #[test]
    fn test_move_blocked_by_creature() {
        let mut area = area();
        let mover = area.spawn_creature(&templates::kinrath("mover"));
        let blocker = area.spawn_creature(&templates::kinrath("blocker").at(0.8, 0.0, 0.0));

        assert_eq!(
            area.find_creature_obstacle(mover, Vec3::new(5.0, 0.0, 0.0)),
            Some(blocker)
        );
        assert!(!area.move_creature_towards(mover, Vec3::new(5.0, 0.0, 0.0), false, 0.5));
        assert_eq!(queries::position_of(&area.world, mover), Some(Vec3::ZERO));

        // Sideways is free
        assert!(area.move_creature_towards(mover, Vec3::new(0.0, 5.0, 0.0), false, 0.1));
        let pos = queries::position_of(&area.world, mover).unwrap();
        assert!((pos.y - 0.175).abs() < 1e-4);
    }

    #[test]
    fn test_move_stops_at_walkmesh_edge() {
        let mut area = area();
        let mover = area.spawn_creature(&templates::kinrath("mover").at(9.9, 0.3, 0.0));

        assert!(!area.move_creature_towards(mover, Vec3::new(15.0, 0.3, 0.0), true, 1.0));
        let pos = queries::position_of(&area.world, mover).unwrap();
        assert!((pos.x - 9.9).abs() < 1e-4);
    }

    #[test]
    fn test_line_of_sight_through_wall() {
        let mut area = area();
        let a = area.spawn_creature(&templates::kinrath("a"));
        let b = area.spawn_creature(&templates::kinrath("b").at(6.0, 0.0, 0.0));
        assert!(area.has_line_of_sight(a, b));

        let wall = walkmesh::Face::new(
            Vec3::new(3.0, -5.0, 0.0),
            Vec3::new(3.0, 5.0, 0.0),
            Vec3::new(3.0, 0.0, 5.0),
            false,
        );
        area.walkmesh = Walkmesh::new(vec![
            Room::square_floor("room_a", Vec2::ZERO, 10.0, 0.0),
            Room::new("wall", vec![wall]),
        ]);
        assert!(!area.has_line_of_sight(a, b));
    }

    #[test]
    fn test_trigger_fires_once_per_entry() {
        let mut area = area();
        let mover = area.spawn_creature(&templates::kinrath("mover"));
        area.add_trigger(
            Trigger::new("tr_door", square(1.0)).with_on_enter("k_door_enter"),
            Vec3::new(2.0, 0.0, 0.0),
        );

        let entered = |area: &Area| {
            area.events
                .iter()
                .filter(|e| matches!(e, GameEvent::ScriptRequested { script, .. } if script == "k_door_enter"))
                .count()
        };

        // Walk 1.75/s: inside after one second, still inside after another half
        assert!(area.move_creature_towards(mover, Vec3::new(5.0, 0.0, 0.0), false, 1.0));
        assert_eq!(entered(&area), 1);
        assert!(area.move_creature_towards(mover, Vec3::new(5.0, 0.0, 0.0), false, 0.5));
        assert_eq!(entered(&area), 1);

        // Leave and come back
        assert!(area.move_creature_towards(mover, Vec3::new(5.0, 0.0, 0.0), false, 1.0));
        assert!(area.move_creature_towards(mover, Vec3::new(0.0, 0.0, 0.0), false, 1.0));
        assert_eq!(entered(&area), 2);
    }

    #[test]
    fn test_leaving_large_trigger_beyond_test_radius() {
        let mut area = area();
        let mover = area.spawn_creature(&templates::kinrath("mover"));
        let mut trigger = Trigger::new("tr_hall", square(9.0)).with_on_enter("k_hall_enter");
        trigger.on_exit = Some("k_hall_exit".to_string());
        let hall = area.add_trigger(trigger, Vec3::ZERO);

        let count = |area: &Area, name: &str| {
            area.events
                .iter()
                .filter(|e| matches!(e, GameEvent::ScriptRequested { script, .. } if script == name))
                .count()
        };
        let teleport = |area: &mut Area, x: f32| {
            area.world.get::<&mut Position>(mover).unwrap().0 = Vec3::new(x, 0.0, 0.0);
            area.check_triggers_intersection(mover);
        };

        teleport(&mut area, 1.0);
        assert_eq!(count(&area, "k_hall_enter"), 1);

        // Outside the polygon and past the 8 unit test radius
        teleport(&mut area, 9.5);
        assert_eq!(count(&area, "k_hall_exit"), 1);
        assert!(!area.world.get::<&Trigger>(hall).unwrap().is_tenant(mover));

        teleport(&mut area, 1.0);
        assert_eq!(count(&area, "k_hall_enter"), 2);
    }

    #[test]
    fn test_transition_trigger_only_for_leader() {
        let mut area = area();
        let leader = area.spawn_creature(&templates::jedi("bastila"));
        let other = area.spawn_creature(&templates::kinrath("kinrath").at(0.0, 2.0, 0.0));
        area.add_trigger(
            Trigger::new("tr_exit", square(1.0)).with_transition("m01ab", "wp_from_m01aa"),
            Vec3::new(2.0, 0.0, 0.0),
        );
        area.add_trigger(
            Trigger::new("tr_exit2", square(1.0)).with_transition("m01ab", "wp_from_m01aa"),
            Vec3::new(2.0, 2.0, 0.0),
        );

        assert!(area.move_creature_towards(other, Vec3::new(2.0, 2.2, 0.0), true, 1.0));
        assert!(!area
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::ModuleTransitionRequested { .. })));

        assert!(area.move_creature_towards(leader, Vec3::new(2.0, 0.0, 0.0), true, 1.0));
        assert!(area.events.iter().any(|e| matches!(
            e,
            GameEvent::ModuleTransitionRequested { module, waypoint }
                if module == "m01ab" && waypoint == "wp_from_m01aa"
        )));
    }

    #[test]
    fn test_visibility_follows_leader() {
        let mut area = area();
        area.spawn_creature(&templates::jedi("bastila"));
        area.update(0);

        assert!(area.visibility.is_visible("room_a"));
        assert!(area.visibility.is_visible("room_b"));

        // room_b does not see room_a
        let leader = area.party.leader().unwrap();
        area.world.get::<&mut Position>(leader).unwrap().0 = Vec3::new(25.0, 0.3, 2.0);
        area.world.insert_one(leader, CurrentRoom(1)).unwrap();
        area.update(10);
        assert!(area.visibility.is_visible("room_b"));
        assert!(!area.visibility.is_visible("room_a"));
    }

    #[test]
    fn test_heartbeat_every_six_seconds() {
        let mut area = area();
        area.heartbeat_script = Some("k_area_heartbeat".to_string());
        let mut def = templates::kinrath("kinrath");
        def.heartbeat_script = Some("k_kinrath_hb".to_string());
        let kinrath = area.spawn_creature(&def);

        let heartbeats = |area: &Area| {
            area.events
                .iter()
                .filter(|e| matches!(e, GameEvent::ScriptRequested { .. }))
                .count()
        };

        area.update(0);
        area.update(5999);
        assert_eq!(heartbeats(&area), 0);

        area.update(6000);
        assert_eq!(heartbeats(&area), 2);
        assert!(area.events.iter().any(|e| matches!(
            e,
            GameEvent::ScriptRequested { caller: Some(c), .. } if *c == kinrath
        )));
    }
}
