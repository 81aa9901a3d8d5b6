//! Timers owned by the combat engine.
//!
//! All three sit on top of [`TimerQueue`], which has no removal: cancellation
//! and "still busy" are tracked in side tables and stale firings are ignored.

use std::collections::{HashMap, HashSet};

use hecs::{Entity, World};

use crate::systems::effects::DamageEffect;
use crate::timer_queue::TimerQueue;

// =============================================================================
// STATE TIMERS
// =============================================================================

/// Per-combatant state transition timers.
///
/// Each arm adds one outstanding timeout; the combatant is busy until every
/// one of them has fired. Cancelling bumps the combatant's epoch so timeouts
/// armed before it no longer count. An epoch is only kept while cancelled
/// timeouts of that combatant are still queued.
#[derive(Debug, Default)]
pub struct StateTimers {
    queue: TimerQueue<(Entity, u32)>,
    pending: HashMap<Entity, u32>,
    epochs: HashMap<Entity, Epoch>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Epoch {
    current: u32,
    /// Cancelled timeouts still in the queue
    stale: u32,
}

impl StateTimers {
    pub fn arm(&mut self, entity: Entity, duration: u32) {
        let epoch = self.current_epoch(entity);
        self.queue.set_timeout((entity, epoch), duration);
        *self.pending.entry(entity).or_insert(0) += 1;
    }

    pub fn update(&mut self, now: u32) {
        self.queue.update(now);
        for (entity, epoch) in std::mem::take(&mut self.queue.completed) {
            if self.current_epoch(entity) != epoch {
                if let Some(entry) = self.epochs.get_mut(&entity) {
                    entry.stale = entry.stale.saturating_sub(1);
                }
                self.prune_epoch(entity);
                continue;
            }
            if let Some(count) = self.pending.get_mut(&entity) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    self.pending.remove(&entity);
                    self.prune_epoch(entity);
                }
            }
        }
    }

    /// Outstanding timeouts for `entity`
    pub fn pending(&self, entity: Entity) -> u32 {
        self.pending.get(&entity).copied().unwrap_or(0)
    }

    #[inline]
    pub fn is_busy(&self, entity: Entity) -> bool {
        self.pending(entity) > 0
    }

    /// Forget `entity`; any of its timeouts still queued fire as no-ops
    pub fn cancel(&mut self, entity: Entity) {
        let Some(count) = self.pending.remove(&entity) else {
            return;
        };
        let entry = self.epochs.entry(entity).or_default();
        entry.current = entry.current.wrapping_add(1);
        entry.stale += count;
    }

    fn current_epoch(&self, entity: Entity) -> u32 {
        self.epochs.get(&entity).map(|e| e.current).unwrap_or(0)
    }

    /// Drop the epoch once nothing queued can refer to an older one
    fn prune_epoch(&mut self, entity: Entity) {
        let drained = self.epochs.get(&entity).is_some_and(|e| e.stale == 0);
        if drained && !self.pending.contains_key(&entity) {
            self.epochs.remove(&entity);
        }
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.pending.clear();
        self.epochs.clear();
    }
}

// =============================================================================
// DEACTIVATION TIMERS
// =============================================================================

/// Delays before a combatant without nearby hostiles leaves the roster.
///
/// Every arm gets a fresh token; a firing only counts if its token is still
/// the armed one.
#[derive(Debug, Default)]
pub struct DeactivationTimers {
    queue: TimerQueue<(Entity, u64)>,
    armed: HashMap<Entity, u64>,
    expired: HashSet<Entity>,
    next_token: u64,
}

impl DeactivationTimers {
    pub fn arm(&mut self, entity: Entity, delay: u32) {
        let token = self.next_token;
        self.next_token += 1;
        self.armed.insert(entity, token);
        self.expired.remove(&entity);
        self.queue.set_timeout((entity, token), delay);
    }

    /// Armed and not yet expired
    pub fn is_armed(&self, entity: Entity) -> bool {
        self.armed.contains_key(&entity)
    }

    pub fn cancel(&mut self, entity: Entity) {
        self.armed.remove(&entity);
        self.expired.remove(&entity);
    }

    pub fn update(&mut self, now: u32) {
        self.queue.update(now);
        for (entity, token) in self.queue.completed.drain(..) {
            if self.armed.get(&entity) == Some(&token) {
                self.armed.remove(&entity);
                self.expired.insert(entity);
            }
        }
    }

    /// Consume an expiry for `entity`
    pub fn take_expired(&mut self, entity: Entity) -> bool {
        self.expired.remove(&entity)
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.armed.clear();
        self.expired.clear();
    }
}

// =============================================================================
// DELAYED EFFECTS
// =============================================================================

/// An effect waiting for its delay to elapse
#[derive(Debug, Clone)]
pub struct PendingEffect {
    pub target: Entity,
    pub effect: DamageEffect,
    /// Projectile to remove from the scene once the effect lands
    pub projectile: Option<Entity>,
}

/// Effects scheduled to land after a delay.
///
/// Entries live in their own arena; the timer payload is the arena handle,
/// which is generation-checked and stays valid until the entry is taken.
#[derive(Default)]
pub struct DelayedEffects {
    arena: World,
    queue: TimerQueue<Entity>,
}

impl std::fmt::Debug for DelayedEffects {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelayedEffects")
            .field("pending", &self.arena.len())
            .finish()
    }
}

impl DelayedEffects {
    /// Schedule `effect` on `target`; the handle identifies the entry until it fires
    pub fn schedule(&mut self, target: Entity, effect: DamageEffect, delay: u32) -> Entity {
        let handle = self.arena.spawn((PendingEffect {
            target,
            effect,
            projectile: None,
        },));
        self.queue.set_timeout(handle, delay);
        handle
    }

    /// Link a projectile to a scheduled entry
    pub fn attach_projectile(&mut self, handle: Entity, projectile: Entity) -> bool {
        match self.arena.get::<&mut PendingEffect>(handle) {
            Ok(mut pending) => {
                pending.projectile = Some(projectile);
                true
            }
            Err(_) => false,
        }
    }

    /// Advance to `now` and hand back every entry whose delay elapsed, earliest first
    pub fn update(&mut self, now: u32) -> Vec<PendingEffect> {
        self.queue.update(now);
        let mut due = Vec::with_capacity(self.queue.completed.len());
        for handle in self.queue.completed.drain(..) {
            if let Ok(pending) = self.arena.remove_one::<PendingEffect>(handle) {
                due.push(pending);
            }
            let _ = self.arena.despawn(handle);
        }
        due
    }

    pub fn len(&self) -> usize {
        self.arena.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::effects::DamageType;

    fn entities(n: usize) -> Vec<Entity> {
        let mut world = World::new();
        (0..n).map(|_| world.spawn(())).collect()
    }

    #[test]
    fn test_state_timer_rearm_keeps_busy() {
        let e = entities(1)[0];
        let mut timers = StateTimers::default();

        timers.update(0);
        timers.arm(e, 100);
        timers.update(50);
        timers.arm(e, 100);
        assert_eq!(timers.pending(e), 2);

        // First fires, second still outstanding
        timers.update(101);
        assert!(timers.is_busy(e));
        assert_eq!(timers.pending(e), 1);

        timers.update(151);
        assert!(!timers.is_busy(e));
    }

    #[test]
    fn test_state_timer_cancel_ignores_stale_firing() {
        let e = entities(1)[0];
        let mut timers = StateTimers::default();
        timers.arm(e, 10);
        timers.cancel(e);
        assert!(!timers.is_busy(e));

        timers.arm(e, 100);
        timers.update(20);
        // The cancelled firing must not release the new arm
        assert!(timers.is_busy(e));
        assert_eq!(timers.pending(e), 1);

        timers.update(101);
        assert!(!timers.is_busy(e));
    }

    #[test]
    fn test_state_timer_epochs_are_pruned() {
        let e = entities(3);
        let mut timers = StateTimers::default();

        // Nothing pending: cancelling leaves no trace
        timers.cancel(e[0]);
        assert!(timers.epochs.is_empty());

        timers.update(0);
        timers.arm(e[1], 10);
        timers.arm(e[2], 10);
        timers.cancel(e[1]);
        timers.cancel(e[2]);
        timers.arm(e[2], 100);
        assert_eq!(timers.epochs.len(), 2);

        // Stale firings drain; e[2] keeps its epoch while its new arm is queued
        timers.update(11);
        assert_eq!(timers.epochs.len(), 1);
        assert!(timers.is_busy(e[2]));

        timers.update(101);
        assert!(!timers.is_busy(e[2]));
        assert!(timers.epochs.is_empty());
    }

    #[test]
    fn test_deactivation_cancel_and_rearm() {
        let e = entities(1)[0];
        let mut timers = DeactivationTimers::default();

        timers.arm(e, 10);
        timers.cancel(e);
        timers.update(20);
        assert!(!timers.take_expired(e));

        timers.arm(e, 10);
        assert!(timers.is_armed(e));
        timers.update(40);
        assert!(!timers.is_armed(e));
        assert!(timers.take_expired(e));
        assert!(!timers.take_expired(e));
    }

    #[test]
    fn test_deactivation_rearm_supersedes_old_token() {
        let e = entities(1)[0];
        let mut timers = DeactivationTimers::default();
        timers.arm(e, 10);
        timers.update(5);
        timers.arm(e, 100);

        timers.update(20);
        assert!(!timers.take_expired(e));
        assert!(timers.is_armed(e));
    }

    #[test]
    fn test_delayed_effects_fire_once_in_order() {
        let e = entities(2);
        let mut effects = DelayedEffects::default();
        effects.schedule(e[0], DamageEffect::new(3, DamageType::Slashing, None), 20);
        effects.schedule(e[1], DamageEffect::new(5, DamageType::Slashing, None), 10);
        assert_eq!(effects.len(), 2);

        assert!(effects.update(10).is_empty());
        let due = effects.update(15);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].target, e[1]);

        let due = effects.update(100);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].effect.amount, 3);
        assert!(effects.is_empty());
        assert!(effects.update(200).is_empty());
    }

    #[test]
    fn test_attach_projectile() {
        let e = entities(2);
        let mut effects = DelayedEffects::default();
        let handle = effects.schedule(e[0], DamageEffect::new(1, DamageType::Blaster, None), 5);
        assert!(effects.attach_projectile(handle, e[1]));

        let due = effects.update(10);
        assert_eq!(due[0].projectile, Some(e[1]));
        assert!(!effects.attach_projectile(handle, e[1]));
    }
}
