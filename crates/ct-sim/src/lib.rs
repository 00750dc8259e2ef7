//! `ct-sim` — population assembly and the two ways of running it.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                   |
//! |----------------|------------------------------------------------------------|
//! | [`config`]     | `SimConfig`, `ParamsConfig`, `Layout`; TOML loading        |
//! | [`population`] | `PopulationBuilder`, `Population`, the virtual scheduler   |
//! | [`runtime`]    | `Simulation`: agent tasks, day clock, neighbor refresher   |
//! | [`stats`]      | `PopulationStats` (metrics sink), `BucketCounts`, `Census` |
//! | [`history`]    | `HistoryLog` (history sink) and the day counter            |
//! | [`observer`]   | `SimObserver`, `NoopObserver`                              |
//! | [`error`]      | `SimError`, `SimResult<T>`                                 |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Computes neighbor adjacency on Rayon's thread pool.    |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use ct_sim::{NoopObserver, PopulationBuilder, SimConfig, Simulation};
//!
//! let population = PopulationBuilder::new(SimConfig::default()).build()?;
//!
//! // Deterministic, as fast as the CPU allows:
//! population.run_days(30).await;
//!
//! // Or live, one task per agent:
//! let sim = Simulation::start(population, Arc::new(NoopObserver));
//! tokio::time::sleep(Duration::from_secs(10)).await;
//! let last_day = sim.shutdown().await?;
//! ```

pub mod config;
pub mod error;
pub mod history;
pub mod observer;
pub mod population;
pub mod runtime;
pub mod stats;


pub use config::{Layout, ParamsConfig, SimConfig};
pub use error::{SimError, SimResult};
pub use history::{DEFAULT_HISTORY_CAPACITY, HistoryLog};
pub use observer::{NoopObserver, SimObserver};
pub use population::{Population, PopulationBuilder};
pub use runtime::Simulation;
pub use stats::{BucketCounts, Census, PopulationStats};
