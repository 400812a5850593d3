//! Escape point selection for agents fleeing a threat.
//!
//! Each control tick, an agent within range of a threat samples a blue-noise
//! set of points around itself, keeps the ones the threat cannot see because
//! the agent's own body is in the way, and heads for the nearest of those.
//!
//! # Modules
//!
//! - [`sampling`]: Poisson-disc point generation with an injectable random source
//! - [`visibility`]: Sightline classification against a [`SceneQuery`]
//! - [`selection`]: World-space candidates and nearest-point selection
//! - [`controller`]: Per-tick orchestration and destination deduplication
//! - [`scene`]: In-memory sphere/box scene for headless use
//! - [`config`]: TOML-backed settings

pub mod config;
pub mod controller;
pub mod error;
pub mod sampling;
pub mod scene;
pub mod selection;
pub mod visibility;

// Re-export config types
pub use config::{default_config_toml, AvoidanceConfig, ConfigError, EvasionConfig, SamplingConfig};

// Re-export controller types
pub use controller::{AgentState, EvasionController, EvasionMode, MovementExecutor};

pub use error::EvasionError;

// Re-export sampling types
pub use sampling::{generate, PoissonDiscSampler, SampleRegion, SamplingError, DEFAULT_MAX_ATTEMPTS};

pub use scene::{Occluder, Shape, StaticScene};

pub use selection::{select_nearest, WorldCandidate};

// Re-export visibility types
pub use visibility::{
    classify_sightline, is_hidden_from_threat, OccupantId, RayHit, SceneQuery, Sightline,
};

// Geometry types used throughout the public API
pub use glam::{Vec2, Vec3};
