//! Trajectory and report formatting

use std::fmt;
use std::io::Write;

use serde::Serialize;

use crate::commands::RunSummary;
use crate::error::Result;
use crate::kinetics::Species;
use crate::simulation::{AnalyticComparison, Trajectory};

/// Write a trajectory as CSV with header `t,A,B,C`
pub fn write_csv<W: Write>(trajectory: &Trajectory, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for point in trajectory.points() {
        csv_writer.serialize(point)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Pretty-printed JSON followed by a newline
pub fn write_json<T: Serialize, W: Write>(value: &T, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    Ok(())
}

/// Per-species deviations as CSV with header `species,max_abs_error,at_time`
pub fn write_comparison_csv<W: Write>(comparison: &AnalyticComparison, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for error in &comparison.species {
        csv_writer.serialize(error)?;
    }
    csv_writer.flush()?;
    Ok(())
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "steps            {}", self.steps)?;
        writeln!(f, "final time [s]   {:.6}", self.final_time)?;
        if let Some(state) = self.final_state {
            for species in Species::ALL {
                writeln!(f, "final {}          {:.6e}", species, state.get(species))?;
            }
        }
        writeln!(f, "initial mass     {:.6e}", self.initial_mass)?;
        writeln!(f, "max mass drift   {:.3e}", self.max_mass_drift)?;
        writeln!(f, "min conc.        {:.3e}", self.min_concentration)
    }
}

impl fmt::Display for AnalyticComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "analytic reference with A0 = {}", self.a0)?;
        for error in &self.species {
            writeln!(
                f,
                "{}: max |sim - exact| = {:.3e} at t = {:.6} s",
                error.species, error.max_abs_error, error.at_time
            )?;
        }
        Ok(())
    }
}
