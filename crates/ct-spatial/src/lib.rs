//! `ct-spatial` — where agents stand and who is close to whom.
//!
//! Everything here runs on the controller side.  Agents never query the
//! index themselves: the controller turns positions into adjacency rows and
//! hands each agent its row as a pending neighbor list.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`layout`]    | `GridLayout`, `random_positions`                          |
//! | [`proximity`] | `ProximityIndex` (R-tree), contact-radius adjacency       |
//! | [`error`]     | `SpatialError`, `SpatialResult<T>`                        |
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                  |
//! |------------|---------------------------------------------------------|
//! | `parallel` | Computes `ProximityIndex::adjacency` rows with Rayon.   |

pub mod error;
pub mod layout;
pub mod proximity;


pub use error::{SpatialError, SpatialResult};
pub use layout::{GridLayout, random_positions};
pub use proximity::ProximityIndex;
