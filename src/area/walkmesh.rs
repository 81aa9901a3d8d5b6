//! Room walkmeshes and ray queries against them.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::constants::ELEVATION_TEST_Z;

/// One walkmesh triangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub vertices: [Vec3; 3],
    /// Walls and obstacles are not walkable
    pub walkable: bool,
}

impl Face {
    pub fn new(a: Vec3, b: Vec3, c: Vec3, walkable: bool) -> Self {
        Self {
            vertices: [a, b, c],
            walkable,
        }
    }

    /// Distance along `dir` at which the ray hits this face, both sides counted
    pub fn raycast(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        raycast_triangle(origin, dir, &self.vertices)
    }
}

/// A room and its walkmesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub name: String,
    pub faces: Vec<Face>,
}

impl Room {
    pub fn new(name: &str, faces: Vec<Face>) -> Self {
        Self {
            name: name.to_string(),
            faces,
        }
    }

    /// Flat square floor centred at `center`, split into two triangles
    pub fn square_floor(name: &str, center: Vec2, half_size: f32, z: f32) -> Self {
        let corner = |dx: f32, dy: f32| Vec3::new(center.x + dx, center.y + dy, z);
        let (a, b, c, d) = (
            corner(-half_size, -half_size),
            corner(half_size, -half_size),
            corner(half_size, half_size),
            corner(-half_size, half_size),
        );
        Self::new(name, vec![Face::new(a, b, c, true), Face::new(a, c, d, true)])
    }
}

/// A ray hit on the walkmesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkmeshHit {
    pub room: usize,
    pub distance: f32,
    pub walkable: bool,
}

/// Walkmeshes of every room in an area
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Walkmesh {
    rooms: Vec<Room>,
}

impl Walkmesh {
    pub fn new(rooms: Vec<Room>) -> Self {
        Self { rooms }
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room_name(&self, room: usize) -> Option<&str> {
        self.rooms.get(room).map(|r| r.name.as_str())
    }

    /// Nearest face hit within `max_distance`, optionally restricted by walkability
    pub fn raycast(
        &self,
        origin: Vec3,
        dir: Vec3,
        max_distance: f32,
        walkable: Option<bool>,
    ) -> Option<WalkmeshHit> {
        let mut best: Option<WalkmeshHit> = None;
        for (room, r) in self.rooms.iter().enumerate() {
            for face in &r.faces {
                if walkable.is_some_and(|w| w != face.walkable) {
                    continue;
                }
                let Some(distance) = face.raycast(origin, dir) else {
                    continue;
                };
                if distance > max_distance {
                    continue;
                }
                if best.map_or(true, |b| distance < b.distance) {
                    best = Some(WalkmeshHit {
                        room,
                        distance,
                        walkable: face.walkable,
                    });
                }
            }
        }
        best
    }

    /// Room and height of the highest walkable face under `point`
    pub fn elevation_at(&self, point: Vec2) -> Option<(usize, f32)> {
        let origin = point.extend(ELEVATION_TEST_Z);
        let hit = self.raycast(origin, Vec3::NEG_Z, f32::INFINITY, Some(true))?;
        Some((hit.room, ELEVATION_TEST_Z - hit.distance))
    }

    /// Distance to the first wall between `from` and `to`, if any
    pub fn first_wall_between(&self, from: Vec3, to: Vec3) -> Option<f32> {
        let offset = to - from;
        let distance = offset.length();
        if distance <= f32::EPSILON {
            return None;
        }
        self.raycast(from, offset / distance, distance, Some(false))
            .map(|hit| hit.distance)
    }
}

/// Moller-Trumbore ray/triangle intersection
pub fn raycast_triangle(origin: Vec3, dir: Vec3, [v0, v1, v2]: &[Vec3; 3]) -> Option<f32> {
    const EPSILON: f32 = 1e-6;

    let edge1 = *v1 - *v0;
    let edge2 = *v2 - *v0;
    let p = dir.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;

    let t_vec = origin - *v0;
    let u = t_vec.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = t_vec.cross(edge1);
    let v = dir.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(q) * inv_det;
    (t >= 0.0).then_some(t)
}

/// Ray/sphere intersection, distance to the first hit in front of the origin
pub fn raycast_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let to_center = origin - center;
    let b = to_center.dot(dir);
    let c = to_center.length_squared() - radius * radius;
    if c > 0.0 && b > 0.0 {
        return None;
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    Some((-b - discriminant.sqrt()).max(0.0))
}
