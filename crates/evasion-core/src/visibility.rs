//! Visibility Classification
//!
//! Decides whether a threat has a clear line of sight to a candidate point.
//! A candidate only counts as hidden when the first thing the threat's ray
//! hits on the way to it is the evading agent's own body.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Identity of a body in the scene that can block rays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OccupantId(pub u64);

/// First intersection reported by a raycast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Body that was hit
    pub occupant: OccupantId,
    /// Distance from the ray origin to the hit point
    pub distance: f32,
}

/// Ray-intersection queries against world geometry.
///
/// Implementations must be total: every call returns a hit or `None`.
pub trait SceneQuery {
    /// Casts a ray from `origin` along the unit vector `direction` and
    /// returns the nearest hit no further than `max_distance`.
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit>;
}

impl<T: SceneQuery + ?Sized> SceneQuery for &T {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        (**self).raycast(origin, direction, max_distance)
    }
}

impl<T: SceneQuery + ?Sized> SceneQuery for Box<T> {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        (**self).raycast(origin, direction, max_distance)
    }
}

/// What the threat's sightline to a candidate ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sightline {
    /// Threat and candidate coincide; there is no direction to cast along
    Degenerate,
    /// Nothing between threat and candidate
    Clear,
    /// The agent's own body is the first hit
    BlockedBySelf,
    /// Some other body is the first hit
    BlockedBy(OccupantId),
}

impl Sightline {
    /// Only a sightline blocked by the agent itself counts as cover.
    pub fn is_hidden(self) -> bool {
        matches!(self, Sightline::BlockedBySelf)
    }
}

/// Casts from the threat toward `candidate` and reports the first hit.
pub fn classify_sightline<S: SceneQuery + ?Sized>(
    scene: &S,
    candidate: Vec3,
    threat: Vec3,
    own_body: OccupantId,
) -> Sightline {
    let offset = candidate - threat;
    let Some(direction) = offset.try_normalize() else {
        return Sightline::Degenerate;
    };

    match scene.raycast(threat, direction, offset.length()) {
        None => Sightline::Clear,
        Some(hit) if hit.occupant == own_body => Sightline::BlockedBySelf,
        Some(hit) => Sightline::BlockedBy(hit.occupant),
    }
}

/// True when the threat's view of `candidate` is blocked by `own_body` first.
pub fn is_hidden_from_threat<S: SceneQuery + ?Sized>(
    scene: &S,
    candidate: Vec3,
    threat: Vec3,
    own_body: OccupantId,
) -> bool {
    classify_sightline(scene, candidate, threat, own_body).is_hidden()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Occluder, Shape, StaticScene};

    const AGENT: OccupantId = OccupantId(1);
    const WALL: OccupantId = OccupantId(2);

    fn scene_with_agent_at_origin() -> StaticScene {
        let mut scene = StaticScene::new();
        scene.insert(Occluder::new(AGENT, Shape::sphere(Vec3::ZERO, 0.5)));
        scene
    }

    #[test]
    fn test_point_behind_agent_is_hidden() {
        let scene = scene_with_agent_at_origin();
        let threat = Vec3::new(3.0, 0.0, 0.0);
        let candidate = Vec3::new(-2.0, 0.0, 0.0);

        assert_eq!(
            classify_sightline(&scene, candidate, threat, AGENT),
            Sightline::BlockedBySelf
        );
        assert!(is_hidden_from_threat(&scene, candidate, threat, AGENT));
    }

    #[test]
    fn test_clear_ray_is_exposed() {
        let scene = scene_with_agent_at_origin();
        let threat = Vec3::new(3.0, 0.0, 0.0);
        let candidate = Vec3::new(0.0, 0.0, 4.0);

        assert_eq!(classify_sightline(&scene, candidate, threat, AGENT), Sightline::Clear);
        assert!(!is_hidden_from_threat(&scene, candidate, threat, AGENT));
    }

    #[test]
    fn test_third_party_occluder_is_not_cover() {
        let mut scene = scene_with_agent_at_origin();
        scene.insert(Occluder::new(
            WALL,
            Shape::aabb(Vec3::new(1.0, -1.0, -1.0), Vec3::new(1.5, 1.0, 1.0)),
        ));
        let threat = Vec3::new(3.0, 0.0, 0.0);
        let candidate = Vec3::new(-2.0, 0.0, 0.0);

        // The wall sits between the threat and the agent, so it is hit first
        assert_eq!(
            classify_sightline(&scene, candidate, threat, AGENT),
            Sightline::BlockedBy(WALL)
        );
        assert!(!is_hidden_from_threat(&scene, candidate, threat, AGENT));
    }

    #[test]
    fn test_candidate_short_of_agent_is_exposed() {
        let scene = scene_with_agent_at_origin();
        let threat = Vec3::new(3.0, 0.0, 0.0);
        // Ray stops before reaching the agent's body
        let candidate = Vec3::new(1.5, 0.0, 0.0);

        assert!(!is_hidden_from_threat(&scene, candidate, threat, AGENT));
    }

    #[test]
    fn test_candidate_on_threat_is_exposed() {
        let scene = scene_with_agent_at_origin();
        let threat = Vec3::new(3.0, 0.0, 0.0);

        assert_eq!(classify_sightline(&scene, threat, threat, AGENT), Sightline::Degenerate);
        assert!(!is_hidden_from_threat(&scene, threat, threat, AGENT));
    }

    #[test]
    fn test_boxed_scene_query() {
        let scene: Box<dyn SceneQuery> = Box::new(scene_with_agent_at_origin());
        let threat = Vec3::new(3.0, 0.0, 0.0);

        assert!(is_hidden_from_threat(&scene, Vec3::new(-2.0, 0.0, 0.0), threat, AGENT));
    }
}
