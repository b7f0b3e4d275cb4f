//! # chaser_core - World Model and Planner for a Grid Pursuit Bot
//!
//! The decision-making core of an autonomous agent for a fog-of-war,
//! grid-based pursuit game on a point-symmetric map of known size but
//! unknown origin. The agent perceives a 3x3 neighborhood per turn plus
//! optional directional probes, and this crate answers the two questions
//! the surrounding turn loop asks every turn: *what do I know about the
//! world* and *what is the best next step toward a given goal*.
//!
//! ## Subsystems
//! - World model & trap classification: sparse tile knowledge in a
//!   bot-centric relative frame, with an explicit per-coordinate trap
//!   state machine
//! - Localizer: absolute-origin hypothesis elimination with soft
//!   boundary scoring and reset-and-replay recovery
//! - Symmetry inference: mirrors observed items through the map center
//! - Enemy belief: a decaying probability field over the opponent
//! - Pathfinder: budgeted, cost-aware A* returning only the first step
//!
//! The core is invoked synchronously once per turn, performs no I/O and
//! never fails fatally; transport, turn loop, rendering and high-level
//! strategy live outside.

pub mod config;
pub mod enemy;
pub mod error;
pub mod localizer;
pub mod path;
pub mod state;
pub mod symmetry;
pub mod types;
pub mod vision;
pub mod world;

pub use config::{CoreConfig, EnemyConfig, LocalizerConfig, PathConfig, TrapConfig};
pub use state::{ChaserCore, CoreSnapshot};
pub use enemy::{EnemyBelief, Sighting};
pub use error::{CoreError, Result};
pub use localizer::{Bounds, Evidence, EvidenceEntry, Localizer};
pub use path::Navigator;
pub use symmetry::Frontier;
pub use types::{Coord, Direction, MapDims, TileKind};
pub use vision::VisionGrid;
pub use world::{TrapBoard, TrapReason, TrapStatus, WorldModel};
