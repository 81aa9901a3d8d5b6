//! Active combatant roster.
//!
//! Round-robin queue of creatures currently in combat plus a membership set.
//! A creature is in the set iff it appears exactly once in the queue.

use std::collections::{HashSet, VecDeque};

use hecs::Entity;

/// Tracks which creatures are active combatants.
///
/// The front entry is the one whose surroundings get scanned this frame;
/// rotating moves it to the back so the scan cost is spread across frames.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    order: VecDeque<Entity>,
    members: HashSet<Entity>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a creature at the back. Returns `false` if it was already active.
    pub fn register(&mut self, entity: Entity) -> bool {
        if !self.members.insert(entity) {
            return false;
        }
        self.order.push_back(entity);
        true
    }

    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.members.contains(&entity)
    }

    pub fn front(&self) -> Option<Entity> {
        self.order.front().copied()
    }

    /// Move the front creature to the back
    pub fn rotate(&mut self) {
        if let Some(entity) = self.order.pop_front() {
            self.order.push_back(entity);
        }
    }

    pub fn pop_front(&mut self) -> Option<Entity> {
        let entity = self.order.pop_front()?;
        self.members.remove(&entity);
        Some(entity)
    }

    /// Remove a creature wherever it is. Returns `false` if it was not active.
    pub fn remove(&mut self, entity: Entity) -> bool {
        if !self.members.remove(&entity) {
            return false;
        }
        self.order.retain(|e| *e != entity);
        true
    }

    /// Roster order, front first
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    /// Membership set and queue agree, with no duplicates
    pub fn is_consistent(&self) -> bool {
        self.order.len() == self.members.len()
            && self.order.iter().all(|e| self.members.contains(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hecs::World;

    fn entities(n: usize) -> Vec<Entity> {
        let mut world = World::new();
        (0..n).map(|_| world.spawn(())).collect()
    }

    #[test]
    fn test_register_is_idempotent() {
        let e = entities(2);
        let mut roster = Roster::new();

        assert!(roster.register(e[0]));
        assert!(!roster.register(e[0]));
        assert!(roster.register(e[1]));
        assert_eq!(roster.len(), 2);
        assert!(roster.is_consistent());
    }

    #[test]
    fn test_rotate_round_robin() {
        let e = entities(3);
        let mut roster = Roster::new();
        for &entity in &e {
            roster.register(entity);
        }

        assert_eq!(roster.front(), Some(e[0]));
        roster.rotate();
        assert_eq!(roster.front(), Some(e[1]));
        roster.rotate();
        roster.rotate();
        assert_eq!(roster.front(), Some(e[0]));
        assert!(roster.is_consistent());
    }

    #[test]
    fn test_pop_and_remove_keep_set_in_sync() {
        let e = entities(3);
        let mut roster = Roster::new();
        for &entity in &e {
            roster.register(entity);
        }

        assert_eq!(roster.pop_front(), Some(e[0]));
        assert!(!roster.contains(e[0]));
        assert!(roster.remove(e[2]));
        assert!(!roster.remove(e[2]));
        assert_eq!(roster.iter().collect::<Vec<_>>(), vec![e[1]]);
        assert!(roster.is_consistent());

        // Re-registering after removal works
        assert!(roster.register(e[0]));
        assert!(roster.is_consistent());
    }
}
