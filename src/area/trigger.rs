//! Trigger volumes.
//!
//! A trigger is a polygon on the XY plane, relative to the trigger's position.
//! Creatures inside are tenants; the on-enter action fires once per entry.

use std::collections::HashSet;

use glam::{Vec2, Vec3};
use hecs::Entity;

/// Trigger component
#[derive(Debug, Clone, Default)]
pub struct Trigger {
    pub tag: String,
    /// Polygon vertices relative to the trigger position
    pub geometry: Vec<Vec2>,
    pub on_enter: Option<String>,
    pub on_exit: Option<String>,
    /// Module to transition to when the party leader enters
    pub linked_to_module: Option<String>,
    /// Waypoint in the linked module
    pub linked_to: Option<String>,
    tenants: HashSet<Entity>,
}

impl Trigger {
    pub fn new(tag: &str, geometry: Vec<Vec2>) -> Self {
        Self {
            tag: tag.to_string(),
            geometry,
            ..Default::default()
        }
    }

    pub fn with_on_enter(mut self, script: &str) -> Self {
        self.on_enter = Some(script.to_string());
        self
    }

    pub fn with_transition(mut self, module: &str, waypoint: &str) -> Self {
        self.linked_to_module = Some(module.to_string());
        self.linked_to = Some(waypoint.to_string());
        self
    }

    /// Whether `point` lies inside the polygon placed at `origin`
    pub fn contains(&self, origin: Vec3, point: Vec2) -> bool {
        point_in_polygon(point - origin.truncate(), &self.geometry)
    }

    pub fn is_tenant(&self, entity: Entity) -> bool {
        self.tenants.contains(&entity)
    }

    /// Returns `false` if already a tenant
    pub fn add_tenant(&mut self, entity: Entity) -> bool {
        self.tenants.insert(entity)
    }

    pub fn remove_tenant(&mut self, entity: Entity) -> bool {
        self.tenants.remove(&entity)
    }
}

/// Even-odd point in polygon test
pub fn point_in_polygon(point: Vec2, polygon: &[Vec2]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > point.y) != (b.y > point.y) {
            let x = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
