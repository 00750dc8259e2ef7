//! `ct-output` — simulation output writers for the contagion simulator.
//!
//! | Backend | Files created                              |
//! |---------|--------------------------------------------|
//! | CSV     | `daily_stats.csv`, `transitions.csv`       |
//!
//! Backends implement [`OutputWriter`] and are driven by [`CsvObserver`]
//! (generic over the writer despite its name), which implements
//! `ct_sim::SimObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ct_output::{CsvObserver, CsvWriter};
//!
//! let observer = Arc::new(CsvObserver::new(CsvWriter::new(Path::new("./output"))?));
//! let population = PopulationBuilder::new(config).observer(observer.clone()).build()?;
//! population.run_days(60).await;
//! population.finish();
//! if let Some(e) = observer.take_error() {
//!     eprintln!("output error: {e}");
//! }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;


pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::CsvObserver;
pub use row::{DailyStatsRow, TransitionRow};
pub use writer::OutputWriter;
