//! Player party.

use hecs::Entity;

/// Ordered party members; the first one leads
#[derive(Debug, Clone, Default)]
pub struct Party {
    members: Vec<Entity>,
}

impl Party {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member at the back. Returns `false` if already in the party.
    pub fn add_member(&mut self, entity: Entity) -> bool {
        if self.members.contains(&entity) {
            return false;
        }
        self.members.push(entity);
        true
    }

    pub fn remove_member(&mut self, entity: Entity) -> bool {
        let before = self.members.len();
        self.members.retain(|e| *e != entity);
        self.members.len() != before
    }

    /// Make `entity` the leader, adding it if needed
    pub fn set_leader(&mut self, entity: Entity) {
        self.members.retain(|e| *e != entity);
        self.members.insert(0, entity);
    }

    pub fn leader(&self) -> Option<Entity> {
        self.members.first().copied()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.members.contains(&entity)
    }

    pub fn members(&self) -> &[Entity] {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
