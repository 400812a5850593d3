//! Static Scene
//!
//! A small in-memory collection of spheres and axis-aligned boxes that answers
//! [`SceneQuery`] raycasts. Used to drive the controller without an engine.

use glam::Vec3;

use crate::visibility::{OccupantId, RayHit, SceneQuery};

/// Collision shape of an occluder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Sphere { center: Vec3, radius: f32 },
    Aabb { min: Vec3, max: Vec3 },
}

impl Shape {
    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Shape::Sphere { center, radius }
    }

    /// Box spanning two corners, in any order.
    pub fn aabb(a: Vec3, b: Vec3) -> Self {
        Shape::Aabb {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn center(&self) -> Vec3 {
        match *self {
            Shape::Sphere { center, .. } => center,
            Shape::Aabb { min, max } => (min + max) * 0.5,
        }
    }

    fn translated(self, offset: Vec3) -> Self {
        match self {
            Shape::Sphere { center, radius } => Shape::Sphere {
                center: center + offset,
                radius,
            },
            Shape::Aabb { min, max } => Shape::Aabb {
                min: min + offset,
                max: max + offset,
            },
        }
    }

    /// Entry distance of a ray into this shape.
    ///
    /// Rays that start inside the shape do not hit it.
    fn ray_entry(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        match *self {
            Shape::Sphere { center, radius } => {
                let to_origin = origin - center;
                let c = to_origin.length_squared() - radius * radius;
                if c <= 0.0 {
                    return None;
                }
                let b = to_origin.dot(direction);
                let discriminant = b * b - c;
                if discriminant < 0.0 {
                    return None;
                }
                let t = -b - discriminant.sqrt();
                (t >= 0.0).then_some(t)
            }
            Shape::Aabb { min, max } => {
                let inverse = direction.recip();
                let t0 = (min - origin) * inverse;
                let t1 = (max - origin) * inverse;
                let near = t0.min(t1).max_element();
                let far = t0.max(t1).min_element();
                // NaN from 0 * inf on an axis-parallel ray fails both comparisons
                if near.is_nan() || far.is_nan() || near > far || near < 0.0 {
                    return None;
                }
                Some(near)
            }
        }
    }
}

/// A body in the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Occluder {
    pub id: OccupantId,
    pub shape: Shape,
}

impl Occluder {
    pub fn new(id: OccupantId, shape: Shape) -> Self {
        Self { id, shape }
    }
}

/// Scene of occluders tested by brute force.
#[derive(Debug, Clone, Default)]
pub struct StaticScene {
    occluders: Vec<Occluder>,
}

impl StaticScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an occluder, replacing any existing one with the same id.
    pub fn insert(&mut self, occluder: Occluder) {
        match self.occluders.iter_mut().find(|o| o.id == occluder.id) {
            Some(existing) => *existing = occluder,
            None => self.occluders.push(occluder),
        }
    }

    pub fn remove(&mut self, id: OccupantId) -> Option<Occluder> {
        let index = self.occluders.iter().position(|o| o.id == id)?;
        Some(self.occluders.remove(index))
    }

    pub fn get(&self, id: OccupantId) -> Option<&Occluder> {
        self.occluders.iter().find(|o| o.id == id)
    }

    /// Translates an occluder so its center sits at `center`.
    ///
    /// Returns false if no occluder has that id.
    pub fn move_to(&mut self, id: OccupantId, center: Vec3) -> bool {
        match self.occluders.iter_mut().find(|o| o.id == id) {
            Some(occluder) => {
                let offset = center - occluder.shape.center();
                occluder.shape = occluder.shape.translated(offset);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.occluders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occluders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Occluder> {
        self.occluders.iter()
    }
}

impl SceneQuery for StaticScene {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        self.occluders
            .iter()
            .filter_map(|o| {
                o.shape
                    .ray_entry(origin, direction)
                    .filter(|t| *t <= max_distance)
                    .map(|distance| RayHit {
                        occupant: o.id,
                        distance,
                    })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}
