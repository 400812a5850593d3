//! Candidate Selection
//!
//! Lifts sampled points into world space and picks the one closest to the agent.

use glam::{Vec2, Vec3};

/// A sampled point placed in the world, with its distance to the agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldCandidate {
    pub position: Vec3,
    pub distance: f32,
}

impl WorldCandidate {
    pub fn new(position: Vec3, agent: Vec3) -> Self {
        Self {
            position,
            distance: position.distance(agent),
        }
    }

    /// Places a sample from a square region of side `region_size` on the
    /// ground plane, centered on the agent.
    pub fn lift(sample: Vec2, agent: Vec3, region_size: f32) -> Self {
        let half = region_size / 2.0;
        let offset = Vec3::new(sample.x - half, 0.0, sample.y - half);
        Self::new(agent + offset, agent)
    }
}

/// Returns the candidate nearest to `agent`, or `None` if there are none.
///
/// Ties go to whichever candidate came first.
pub fn select_nearest<I>(candidates: I, agent: Vec3) -> Option<WorldCandidate>
where
    I: IntoIterator<Item = WorldCandidate>,
{
    let mut best: Option<(WorldCandidate, f32)> = None;

    for candidate in candidates {
        let distance = candidate.position.distance_squared(agent);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((candidate, distance)),
        }
    }

    best.map(|(candidate, _)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lift_centers_region_on_agent() {
        let agent = Vec3::new(4.0, 1.0, -2.0);
        let candidate = WorldCandidate::lift(Vec2::new(10.0, 10.0), agent, 20.0);

        assert_eq!(candidate.position, agent);
        assert_eq!(candidate.distance, 0.0);

        let corner = WorldCandidate::lift(Vec2::new(0.0, 20.0), agent, 20.0);
        assert_eq!(corner.position, Vec3::new(-6.0, 1.0, 8.0));
    }

    #[test]
    fn test_selects_minimum_distance() {
        let agent = Vec3::ZERO;
        let candidates = vec![
            WorldCandidate::new(Vec3::new(5.0, 0.0, 0.0), agent),
            WorldCandidate::new(Vec3::new(0.0, 0.0, -2.0), agent),
            WorldCandidate::new(Vec3::new(3.0, 0.0, 3.0), agent),
        ];

        let chosen = select_nearest(candidates, agent).unwrap();
        assert_eq!(chosen.position, Vec3::new(0.0, 0.0, -2.0));
        assert_eq!(chosen.distance, 2.0);
    }

    #[test]
    fn test_tie_goes_to_first() {
        let agent = Vec3::ZERO;
        let candidates = vec![
            WorldCandidate::new(Vec3::new(0.0, 0.0, 4.0), agent),
            WorldCandidate::new(Vec3::new(4.0, 0.0, 0.0), agent),
            WorldCandidate::new(Vec3::new(-4.0, 0.0, 0.0), agent),
        ];

        let chosen = select_nearest(candidates, agent).unwrap();
        assert_eq!(chosen.position, Vec3::new(0.0, 0.0, 4.0));
    }

    #[test]
    fn test_empty_returns_none() {
        assert_eq!(select_nearest(Vec::new(), Vec3::ZERO), None);
    }
}
