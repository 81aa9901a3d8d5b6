//! Action execution.
//!
//! Once per frame every living creature works on the head of its action
//! queue. Attack actions are only brought into range here; delivering them is
//! up to the combat engine, which runs right after.

use glam::Vec3;
use hecs::Entity;

use crate::actions::{Action, ActionQueue};
use crate::area::Area;
use crate::components::{Dead, Facing, ObjectId};
use crate::constants::ARRIVAL_DISTANCE;
use crate::events::GameEvent;
use crate::queries;

/// Outcome of one frame of work on an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionResult {
    /// Keep the action at the head of the queue
    InProgress,
    /// Pop the action
    Completed,
}

/// Drive the head action of every living creature
pub fn execute_actions(area: &mut Area, now: u32, dt: f32) {
    puffin::profile_function!();

    let mut actors: Vec<(ObjectId, Entity)> = area
        .world
        .query::<(&ActionQueue, &ObjectId)>()
        .without::<&Dead>()
        .iter()
        .filter(|(_, (queue, _))| !queue.is_empty())
        .map(|(entity, (_, id))| (*id, entity))
        .collect();
    actors.sort_by_key(|(id, _)| *id);

    for (_, entity) in actors {
        let Some(action) = current_action(area, entity) else {
            continue;
        };

        let result = match action {
            Action::MoveToPoint { destination, run } => {
                move_to_point(area, entity, destination, run, dt)
            }
            Action::Attack(attack) => {
                approach_target(area, entity, attack.target, attack.range, attack.pursue, dt)
            }
            Action::Follow { target, distance } => follow(area, entity, target, distance, dt),
            Action::StartConversation { target, dialog } => {
                area.events.push(GameEvent::ConversationRequested {
                    speaker: entity,
                    target,
                    dialog,
                });
                ActionResult::Completed
            }
            Action::Wait { until } => {
                if now >= until {
                    ActionResult::Completed
                } else {
                    ActionResult::InProgress
                }
            }
        };

        if result == ActionResult::Completed {
            if let Ok(mut queue) = area.world.get::<&mut ActionQueue>(entity) {
                queue.pop_current();
            }
        }
    }
}

fn current_action(area: &Area, entity: Entity) -> Option<Action> {
    area.world
        .get::<&ActionQueue>(entity)
        .ok()?
        .current_action()
        .cloned()
}

fn move_to_point(area: &mut Area, entity: Entity, destination: Vec3, run: bool, dt: f32) -> ActionResult {
    let Some(pos) = queries::position_of(&area.world, entity) else {
        return ActionResult::Completed;
    };
    if pos.truncate().distance(destination.truncate()) <= ARRIVAL_DISTANCE {
        return ActionResult::Completed;
    }
    if !area.move_creature_towards(entity, destination, run, dt) {
        tracing::trace!("{} blocked", queries::describe(&area.world, entity));
        return ActionResult::Completed;
    }
    ActionResult::InProgress
}

/// Bring the attacker within `range` of the target, chasing if `pursue` is set
fn approach_target(
    area: &mut Area,
    entity: Entity,
    target: Entity,
    range: f32,
    pursue: bool,
    dt: f32,
) -> ActionResult {
    if !queries::is_alive(&area.world, target) {
        return ActionResult::Completed;
    }
    let (Some(from), Some(to)) = (
        queries::position_of(&area.world, entity),
        queries::position_of(&area.world, target),
    ) else {
        return ActionResult::Completed;
    };

    let in_range = from.distance(to) <= range;
    if let Ok(mut queue) = area.world.get::<&mut ActionQueue>(entity) {
        if let Some(attack) = queue.current_action_mut().and_then(Action::as_attack_mut) {
            attack.in_range = in_range;
        }
    }

    if in_range {
        if let Some(facing) = Facing::towards(from, to) {
            let _ = area.world.insert_one(entity, facing);
        }
        return ActionResult::InProgress;
    }
    if !pursue {
        return ActionResult::Completed;
    }

    step_towards(area, entity, from, to, range, true, dt);
    ActionResult::InProgress
}

fn follow(area: &mut Area, entity: Entity, target: Entity, distance: f32, dt: f32) -> ActionResult {
    if !queries::is_alive(&area.world, target) {
        return ActionResult::Completed;
    }
    let (Some(from), Some(to)) = (
        queries::position_of(&area.world, entity),
        queries::position_of(&area.world, target),
    ) else {
        return ActionResult::Completed;
    };

    if from.distance(to) > distance {
        step_towards(area, entity, from, to, distance, true, dt);
    }
    ActionResult::InProgress
}

/// Head for a point just inside `keep_distance` of `to`, so the target itself
/// never counts as an obstacle
fn step_towards(
    area: &mut Area,
    entity: Entity,
    from: Vec3,
    to: Vec3,
    keep_distance: f32,
    run: bool,
    dt: f32,
) -> bool {
    let offset = to - from;
    let distance = offset.length();
    if distance <= f32::EPSILON {
        return false;
    }
    let stop_at = (keep_distance - ARRIVAL_DISTANCE).max(0.0);
    let destination = to - offset / distance * stop_at;
    area.move_creature_towards(entity, destination, run, dt)
}
