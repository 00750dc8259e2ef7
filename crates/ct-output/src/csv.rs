//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `daily_stats.csv`
//! - `transitions.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{DailyStatsRow, OutputResult, TransitionRow};

/// Writes simulation output to two CSV files.
pub struct CsvWriter {
    daily:       Writer<File>,
    transitions: Writer<File>,
    finished:    bool,
}

impl CsvWriter {
    /// Create `dir` if needed, open (or truncate) the two CSV files in it,
    /// and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;

        let mut daily = Writer::from_path(dir.join("daily_stats.csv"))?;
        daily.write_record(["day", "vulnerable", "sick", "asymptomatic", "immune", "dead"])?;

        let mut transitions = Writer::from_path(dir.join("transitions.csv"))?;
        transitions.write_record(["agent_id", "state", "day"])?;

        Ok(Self { daily, transitions, finished: false })
    }
}

impl OutputWriter for CsvWriter {
    fn write_daily_stats(&mut self, row: &DailyStatsRow) -> OutputResult<()> {
        self.daily.write_record(&[
            row.day.to_string(),
            row.vulnerable.to_string(),
            row.sick.to_string(),
            row.asymptomatic.to_string(),
            row.immune.to_string(),
            row.dead.to_string(),
        ])?;
        Ok(())
    }

    fn write_transition(&mut self, row: &TransitionRow) -> OutputResult<()> {
        self.transitions.write_record(&[row.agent_id.to_string(), row.state.to_string(), row.day.to_string()])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.daily.flush()?;
        self.transitions.flush()?;
        Ok(())
    }
}
