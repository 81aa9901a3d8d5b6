//! Actions and per-creature action queues.
//!
//! An action is an intent the owning creature works through over several
//! frames. Combat reads the head of the queue and pushes new attacks; the
//! per-frame execution lives in `systems::actions`.

use std::collections::VecDeque;

use glam::Vec3;
use hecs::Entity;

use crate::combat::attack::AttackResultType;

/// Attack intent
#[derive(Debug, Clone, PartialEq)]
pub struct AttackAction {
    pub target: Entity,
    /// Maximum distance the attack can be delivered from
    pub range: f32,
    /// Run toward the target until in range instead of giving up
    pub pursue: bool,
    /// Set by action execution once the target is within `range`
    pub in_range: bool,
    /// Scripted attacks skip the roll
    pub forced_outcome: Option<AttackResultType>,
    /// Scripted attacks may also fix the damage
    pub forced_damage: Option<i32>,
}

impl AttackAction {
    pub fn new(target: Entity, range: f32) -> Self {
        Self {
            target,
            range,
            pursue: false,
            in_range: false,
            forced_outcome: None,
            forced_damage: None,
        }
    }

    pub fn pursuing(mut self) -> Self {
        self.pursue = true;
        self
    }

    pub fn with_outcome(mut self, outcome: AttackResultType, damage: Option<i32>) -> Self {
        self.forced_outcome = Some(outcome);
        self.forced_damage = damage;
        self
    }
}

/// Something a creature intends to do
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    MoveToPoint { destination: Vec3, run: bool },
    Attack(AttackAction),
    /// Stay within `distance` of the target
    Follow { target: Entity, distance: f32 },
    StartConversation { target: Entity, dialog: String },
    /// Idle until the given tick
    Wait { until: u32 },
}

impl Action {
    #[inline]
    pub fn is_attack(&self) -> bool {
        matches!(self, Action::Attack(_))
    }

    pub fn as_attack(&self) -> Option<&AttackAction> {
        match self {
            Action::Attack(attack) => Some(attack),
            _ => None,
        }
    }

    pub fn as_attack_mut(&mut self) -> Option<&mut AttackAction> {
        match self {
            Action::Attack(attack) => Some(attack),
            _ => None,
        }
    }
}

/// Action queue component - FIFO of pending intents
#[derive(Debug, Clone, Default)]
pub struct ActionQueue {
    actions: VecDeque<Action>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// The action being worked on, if any
    pub fn current_action(&self) -> Option<&Action> {
        self.actions.front()
    }

    pub fn current_action_mut(&mut self) -> Option<&mut Action> {
        self.actions.front_mut()
    }

    pub fn push(&mut self, action: Action) {
        self.actions.push_back(action);
    }

    /// Complete the current action
    pub fn pop_current(&mut self) -> Option<Action> {
        self.actions.pop_front()
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Head attack that is ready to be delivered
    pub fn attack_in_range(&self) -> Option<&AttackAction> {
        self.current_action()
            .and_then(Action::as_attack)
            .filter(|attack| attack.in_range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hecs::World;

    #[test]
    fn test_fifo_order() {
        let mut queue = ActionQueue::new();
        queue.push(Action::Wait { until: 1 });
        queue.push(Action::Wait { until: 2 });

        assert_eq!(queue.pop_current(), Some(Action::Wait { until: 1 }));
        assert_eq!(queue.current_action(), Some(&Action::Wait { until: 2 }));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_attack_accessors() {
        let mut world = World::new();
        let target = world.spawn(());
        let mut queue = ActionQueue::new();
        queue.push(Action::Attack(AttackAction::new(target, 2.0)));

        assert!(queue.current_action().unwrap().is_attack());
        assert!(queue.attack_in_range().is_none());

        if let Some(attack) = queue.current_action_mut().and_then(Action::as_attack_mut) {
            attack.in_range = true;
        }
        assert_eq!(queue.attack_in_range().map(|a| a.target), Some(target));
    }

    #[test]
    fn test_non_attack_head_hides_attack() {
        let mut world = World::new();
        let target = world.spawn(());
        let mut queue = ActionQueue::new();
        queue.push(Action::Wait { until: 5 });
        let mut attack = AttackAction::new(target, 2.0);
        attack.in_range = true;
        queue.push(Action::Attack(attack));

        assert!(queue.attack_in_range().is_none());
        assert!(queue.current_action().unwrap().as_attack().is_none());
    }
}
