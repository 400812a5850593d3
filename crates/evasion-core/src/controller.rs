//! Evasion Controller
//!
//! Runs the escape pipeline once per control tick while a threat is inside the
//! avoid range, and forwards new destinations to a movement executor.
//!
//! ```text
//! tick ─▶ range check ─▶ sample region ─▶ sightline per point ─▶ nearest hidden
//!                                                                     │
//!                          movement executor ◀── differs from last? ◀─┘
//! ```
//!
//! There is no hysteresis: a threat sitting right on the avoid range flips the
//! mode every time it crosses, and each flip is logged.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::EvasionConfig;
use crate::error::{ensure_finite, EvasionError};
use crate::sampling::PoissonDiscSampler;
use crate::selection::{select_nearest, WorldCandidate};
use crate::visibility::{classify_sightline, OccupantId, SceneQuery};

/// Receives destinations chosen by the controller and moves the agent there.
pub trait MovementExecutor {
    fn set_destination(&mut self, point: Vec3, speed: f32);
}

impl<T: MovementExecutor + ?Sized> MovementExecutor for &mut T {
    fn set_destination(&mut self, point: Vec3, speed: f32) {
        (**self).set_destination(point, speed)
    }
}

/// Whether the controller is currently fleeing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvasionMode {
    /// No threat, or the threat is at or beyond the avoid range
    #[default]
    Idle,
    /// Threat is inside the avoid range
    Evading,
}

/// Per-agent state carried between ticks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentState {
    /// Current world position of the agent
    pub position: Vec3,
    /// Current world position of the threat, if there is one
    pub threat: Option<Vec3>,
    /// Last destination handed to the movement executor
    pub last_destination: Option<Vec3>,
    /// Mode observed on the most recent tick
    pub mode: EvasionMode,
}

impl AgentState {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_threat(mut self, threat: Vec3) -> Self {
        self.threat = Some(threat);
        self
    }
}

/// Picks hidden escape points and drives a movement executor toward them.
#[derive(Debug)]
pub struct EvasionController<S, M> {
    config: EvasionConfig,
    scene: S,
    executor: M,
    /// Scene body belonging to the agent being controlled
    own_body: OccupantId,
    reported_missing_threat: bool,
}

impl<S: SceneQuery, M: MovementExecutor> EvasionController<S, M> {
    pub fn new(config: EvasionConfig, scene: S, executor: M, own_body: OccupantId) -> Self {
        Self {
            config,
            scene,
            executor,
            own_body,
            reported_missing_threat: false,
        }
    }

    pub fn config(&self) -> &EvasionConfig {
        &self.config
    }

    pub fn own_body(&self) -> OccupantId {
        self.own_body
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// Mutable scene access, for moving bodies between ticks.
    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn executor(&self) -> &M {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut M {
        &mut self.executor
    }

    pub fn into_parts(self) -> (S, M) {
        (self.scene, self.executor)
    }

    /// Mode implied by the current positions, without running the pipeline.
    pub fn mode_for(&self, agent: Vec3, threat: Option<Vec3>) -> EvasionMode {
        match threat {
            Some(threat) if agent.distance(threat) < self.config.avoidance.avoid_range => {
                EvasionMode::Evading
            }
            _ => EvasionMode::Idle,
        }
    }

    /// Evaluates one control tick.
    ///
    /// Returns the destination issued to the movement executor this tick, or
    /// `None` if the agent is idle, no hidden point exists, or the best point
    /// equals the previous destination.
    pub fn evaluate_tick<R: Rng + ?Sized>(
        &mut self,
        state: &mut AgentState,
        rng: &mut R,
    ) -> Result<Option<Vec3>, EvasionError> {
        let agent = ensure_finite("agent", state.position)?;
        let threat = state.threat.map(|t| ensure_finite("threat", t)).transpose()?;

        if threat.is_none() && !self.reported_missing_threat {
            self.reported_missing_threat = true;
            tracing::debug!(body = self.own_body.0, "No threat assigned to avoid");
        }

        let mode = self.mode_for(agent, threat);
        if mode != state.mode {
            tracing::debug!(body = self.own_body.0, from = ?state.mode, to = ?mode, "Evasion mode changed");
            state.mode = mode;
        }

        let Some(threat) = threat.filter(|_| mode == EvasionMode::Evading) else {
            return Ok(None);
        };

        let Some(escape) = self.find_escape_point(agent, threat, rng)? else {
            tracing::debug!(body = self.own_body.0, "No hidden escape point this tick");
            return Ok(None);
        };

        if state.last_destination == Some(escape.position) {
            return Ok(None);
        }

        let speed = self.config.avoidance.travel_speed;
        tracing::info!(
            body = self.own_body.0,
            destination = %escape.position,
            distance = escape.distance,
            "Issuing escape destination"
        );
        state.last_destination = Some(escape.position);
        self.executor.set_destination(escape.position, speed);

        Ok(Some(escape.position))
    }

    /// Samples around `agent` and returns the nearest point hidden from `threat`.
    pub fn find_escape_point<R: Rng + ?Sized>(
        &self,
        agent: Vec3,
        threat: Vec3,
        rng: &mut R,
    ) -> Result<Option<WorldCandidate>, EvasionError> {
        let sampling = &self.config.sampling;
        let sampler = PoissonDiscSampler::new(sampling.region(), sampling.max_attempts, rng)?;

        let mut sampled = 0usize;
        let hidden: Vec<WorldCandidate> = sampler
            .inspect(|_| sampled += 1)
            .map(|sample| WorldCandidate::lift(sample, agent, sampling.region_size))
            .filter(|candidate| {
                let sightline =
                    classify_sightline(&self.scene, candidate.position, threat, self.own_body);
                tracing::trace!(position = %candidate.position, ?sightline, "Classified candidate");
                sightline.is_hidden()
            })
            .collect();

        tracing::debug!(sampled, hidden = hidden.len(), "Escape point sampling complete");

        Ok(select_nearest(hidden, agent))
    }
}
