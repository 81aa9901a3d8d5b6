//! Room visibility.
//!
//! Visibility pairs are parsed once when the area loads. In third-person view
//! only the leader's room and the rooms it sees are visible.

use std::collections::{HashMap, HashSet};

/// Camera mode of the area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraMode {
    #[default]
    ThirdPerson,
    FirstPerson,
    Static,
    Animated,
}

/// Directed room visibility and the set of currently visible rooms
#[derive(Debug, Clone, Default)]
pub struct RoomVisibility {
    adjacency: HashMap<String, HashSet<String>>,
    visible: HashSet<String>,
}

impl RoomVisibility {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(room, sees)` pairs
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut visibility = Self::new();
        for (room, sees) in pairs {
            visibility.add_pair(room, sees);
        }
        visibility
    }

    pub fn add_pair(&mut self, room: &str, sees: &str) {
        self.adjacency
            .entry(room.to_string())
            .or_default()
            .insert(sees.to_string());
    }

    /// Recompute the visible set
    pub fn update<'a>(
        &mut self,
        rooms: impl IntoIterator<Item = &'a str>,
        leader_room: Option<&str>,
        mode: CameraMode,
    ) {
        puffin::profile_function!();

        self.visible.clear();
        match (mode, leader_room) {
            (CameraMode::ThirdPerson, Some(room)) => {
                self.visible.insert(room.to_string());
                if let Some(seen) = self.adjacency.get(room) {
                    self.visible.extend(seen.iter().cloned());
                }
            }
            _ => self.visible.extend(rooms.into_iter().map(str::to_string)),
        }
    }

    pub fn is_visible(&self, room: &str) -> bool {
        self.visible.contains(room)
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }
}
