//! `ct-core` — foundational types for the `contagion` epidemic simulator.
//!
//! This crate is a dependency of every other `ct-*` crate.  It intentionally
//! has no `ct-*` dependencies and minimal external ones (`rand`, `thiserror`,
//! `parking_lot`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `AgentId`                                             |
//! | [`geo`]         | `Point`, `Arena`, `Heading`, the random-walk step     |
//! | [`time`]        | `FRAMES_PER_DAY`, `FrameCounter`, `SimDay`            |
//! | [`rng`]         | `AgentRng` (per-agent), `SimRng` (controller)         |
//! | [`params`]      | `DiseaseParams`, `SimParams`, `SharedParams`          |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to public value types.      |

pub mod error;
pub mod geo;
pub mod ids;
pub mod params;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use geo::{Arena, Heading, Point};
pub use ids::AgentId;
pub use params::{DiseaseParams, SharedParams, SimParams};
pub use rng::{AgentRng, SimRng};
pub use time::{FRAMES_PER_DAY, FrameCounter, SimDay};
