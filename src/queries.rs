//! Common entity query helpers.
//!
//! Reusable read-only queries used by combat, actions and the area. Every
//! helper tolerates despawned entities and answers as if the entity were gone.

use glam::Vec3;
use hecs::{Entity, World};

use crate::components::{Creature, Dead, Health, ObjectId, Position};
use crate::faction::FactionId;

/// Check if an entity still exists and is not dead.
pub fn is_alive(world: &World, entity: Entity) -> bool {
    if !world.contains(entity) || world.get::<&Dead>(entity).is_ok() {
        return false;
    }
    world
        .get::<&Health>(entity)
        .map(|h| !h.is_dead())
        .unwrap_or(true)
}

/// Get an entity's world position.
pub fn position_of(world: &World, entity: Entity) -> Option<Vec3> {
    world.get::<&Position>(entity).ok().map(|p| p.0)
}

/// Distance between two entities, if both have a position.
pub fn distance_between(world: &World, a: Entity, b: Entity) -> Option<f32> {
    Some(position_of(world, a)?.distance(position_of(world, b)?))
}

/// Get an entity's faction id.
pub fn faction_of(world: &World, entity: Entity) -> Option<FactionId> {
    world.get::<&FactionId>(entity).ok().map(|f| *f)
}

/// All living creatures with their positions, in world iteration order.
pub fn creatures_in_area(world: &World) -> Vec<(Entity, Vec3)> {
    world
        .query::<(&Creature, &Position)>()
        .without::<&Dead>()
        .iter()
        .filter(|(entity, _)| is_alive(world, *entity))
        .map(|(entity, (_, pos))| (entity, pos.0))
        .collect()
}

/// Creature tag for logging; falls back to the entity handle.
pub fn describe(world: &World, entity: Entity) -> String {
    match (
        world.get::<&Creature>(entity),
        world.get::<&ObjectId>(entity),
    ) {
        (Ok(creature), Ok(id)) => format!("{}#{}", creature.tag, id.0),
        (Ok(creature), Err(_)) => creature.tag.clone(),
        _ => format!("{:?}", entity),
    }
}

/// Find the `nth` creature carrying `tag` (0-based).
pub fn find_by_tag(world: &World, tag: &str, nth: usize) -> Option<Entity> {
    let mut matches: Vec<(ObjectId, Entity)> = world
        .query::<(&Creature, &ObjectId)>()
        .iter()
        .filter(|(_, (creature, _))| creature.tag == tag)
        .map(|(entity, (_, id))| (*id, entity))
        .collect();
    // Spawn order, not archetype order
    matches.sort_by_key(|(id, _)| *id);
    matches.get(nth).map(|(_, entity)| *entity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_alive() {
        let mut world = World::new();
        let healthy = world.spawn((Health::new(5),));
        let wounded = world.spawn((Health { current: 0, max: 5 },));
        let marked = world.spawn((Health::new(5), Dead));
        let gone = world.spawn(());
        world.despawn(gone).unwrap();

        assert!(is_alive(&world, healthy));
        assert!(!is_alive(&world, wounded));
        assert!(!is_alive(&world, marked));
        assert!(!is_alive(&world, gone));
    }

    #[test]
    fn test_creatures_in_area_skips_dead() {
        let mut world = World::new();
        let a = world.spawn((Creature::new("a"), Position::new(0.0, 0.0, 0.0)));
        world.spawn((Creature::new("b"), Position::new(1.0, 0.0, 0.0), Dead));
        world.spawn((Position::new(2.0, 0.0, 0.0),));

        let creatures = creatures_in_area(&world);
        assert_eq!(creatures.len(), 1);
        assert_eq!(creatures[0].0, a);
    }

    #[test]
    fn test_distance_between() {
        let mut world = World::new();
        let a = world.spawn((Position::new(0.0, 0.0, 0.0),));
        let b = world.spawn((Position::new(3.0, 4.0, 0.0),));
        let c = world.spawn(());

        assert_eq!(distance_between(&world, a, b), Some(5.0));
        assert_eq!(distance_between(&world, a, c), None);
    }

    #[test]
    fn test_find_by_tag_nth() {
        let mut world = World::new();
        let first = world.spawn((Creature::new("guard"), ObjectId(2)));
        world.spawn((Creature::new("dog"), ObjectId(3)));
        let second = world.spawn((Creature::new("guard"), ObjectId(4)));

        assert_eq!(find_by_tag(&world, "guard", 0), Some(first));
        assert_eq!(find_by_tag(&world, "guard", 1), Some(second));
        assert_eq!(find_by_tag(&world, "guard", 2), None);
        assert_eq!(describe(&world, first), "guard#2");
    }
}
