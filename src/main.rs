//! A -> B -> C Reaction Simulator - Main Entry Point
//!
//! Command-line front end: simulate, print the analytic solution, or compare both.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use abc_simulator_lib::commands;
use abc_simulator_lib::output;
use abc_simulator_lib::{Result, RunConfig};
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "abc-simulator")]
#[command(about = "Explicit-Euler simulation of the sequential reaction A -> B -> C")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Integrate the reaction and report the trajectory
    Simulate(RunArgs),
    /// Evaluate the closed-form solution on the same time grid
    Analytic(RunArgs),
    /// Simulate and report the deviation from the closed-form solution
    Compare(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// JSON run file; flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rate constant A -> B [1/s]
    #[arg(long)]
    k1: Option<f64>,

    /// Rate constant B -> C [1/s]
    #[arg(long)]
    k2: Option<f64>,

    #[arg(long)]
    a0: Option<f64>,

    #[arg(long)]
    b0: Option<f64>,

    #[arg(long)]
    c0: Option<f64>,

    /// Final integration time [s]
    #[arg(long)]
    t_end: Option<f64>,

    /// Time step [s]
    #[arg(long)]
    dt: Option<f64>,

    #[arg(long)]
    tol_mass: Option<f64>,

    #[arg(long)]
    tol_neg: Option<f64>,

    /// Skip the non-negativity and mass-conservation checks
    #[arg(long)]
    no_checks: bool,

    /// Clamp negative concentrations to zero in the output
    #[arg(long)]
    clip_negative: bool,

    #[arg(long, value_enum, default_value_t = Format::Summary)]
    format: Format,

    /// Write to this file instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Summary,
    Csv,
    Json,
}

impl RunArgs {
    fn to_config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_file(path)?,
            None => RunConfig::default(),
        };

        if let Some(k1) = self.k1 {
            config.kinetics.k1 = k1;
        }
        if let Some(k2) = self.k2 {
            config.kinetics.k2 = k2;
        }
        if let Some(a0) = self.a0 {
            config.initial.a = a0;
        }
        if let Some(b0) = self.b0 {
            config.initial.b = b0;
        }
        if let Some(c0) = self.c0 {
            config.initial.c = c0;
        }
        if let Some(t_end) = self.t_end {
            config.t_end = t_end;
        }
        if let Some(dt) = self.dt {
            config.dt = dt;
        }
        if let Some(tol_mass) = self.tol_mass {
            config.thresholds.tol_mass = tol_mass;
        }
        if let Some(tol_neg) = self.tol_neg {
            config.thresholds.tol_neg = tol_neg;
        }
        if self.no_checks {
            config.checks = false;
        }
        if self.clip_negative {
            config.clip_negative = true;
        }

        Ok(config)
    }

    fn writer(&self) -> Result<Box<dyn Write>> {
        Ok(match &self.output {
            Some(path) => Box::new(BufWriter::new(File::create(path)?)),
            None => Box::new(io::stdout().lock()),
        })
    }
}

fn write_simulation(args: &RunArgs, response: &commands::SimulationResponse) -> Result<()> {
    let mut writer = args.writer()?;
    match args.format {
        Format::Summary => write!(writer, "{}", response.summary)?,
        Format::Csv => output::write_csv(&response.trajectory, &mut writer)?,
        Format::Json => output::write_json(response, &mut writer)?,
    }
    writer.flush()?;
    Ok(())
}

fn write_comparison(args: &RunArgs, response: &commands::ComparisonResponse) -> Result<()> {
    let mut writer = args.writer()?;
    match args.format {
        Format::Summary => write!(writer, "{}{}", response.summary, response.comparison)?,
        Format::Csv => output::write_comparison_csv(&response.comparison, &mut writer)?,
        Format::Json => output::write_json(response, &mut writer)?,
    }
    writer.flush()?;
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Simulate(args) => {
            let response = commands::run_simulation(&args.to_config()?)?;
            write_simulation(&args, &response)
        }
        Command::Analytic(args) => {
            let response = commands::analytic_profile(&args.to_config()?)?;
            write_simulation(&args, &response)
        }
        Command::Compare(args) => {
            let response = commands::compare(&args.to_config()?)?;
            write_comparison(&args, &response)
        }
    }
}

fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abc_simulator_lib::{Concentrations, KineticParams};

    fn run_args(argv: &[&str]) -> RunArgs {
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Simulate(args) | Command::Analytic(args) | Command::Compare(args) => args,
        }
    }

    #[test]
    fn test_no_flags_gives_default_config() {
        let args = run_args(&["abc-simulator", "simulate"]);
        assert_eq!(args.to_config().unwrap(), RunConfig::default());
        assert_eq!(args.format, Format::Summary);
        assert!(args.output.is_none());
    }

    #[test]
    fn test_flags_override_config() {
        let args = run_args(&[
            "abc-simulator",
            "compare",
            "--k1", "2.5",
            "--k2", "0.5",
            "--a0", "3",
            "--b0", "0.25",
            "--c0", "0.125",
            "--t-end", "4",
            "--dt", "0.01",
            "--tol-mass", "1e-6",
            "--tol-neg", "1e-8",
            "--no-checks",
            "--clip-negative",
            "--format", "csv",
        ]);
        let config = args.to_config().unwrap();

        assert_eq!(config.kinetics, KineticParams::new(2.5, 0.5));
        assert_eq!(config.initial, Concentrations::new(3.0, 0.25, 0.125));
        assert_eq!(config.t_end, 4.0);
        assert_eq!(config.dt, 0.01);
        assert_eq!(config.thresholds.tol_mass, 1e-6);
        assert_eq!(config.thresholds.tol_neg, 1e-8);
        assert!(!config.checks);
        assert!(config.clip_negative);
        assert_eq!(args.format, Format::Csv);
    }

    #[test]
    fn test_flags_override_run_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"t_end": 2.0, "kinetics": {{"k1": 7.0, "k2": 3.0}}}}"#).unwrap();
        let path = file.path().to_str().unwrap();

        let config = run_args(&["abc-simulator", "analytic", "--config", path, "--k2", "1.5"])
            .to_config()
            .unwrap();
        assert_eq!(config.t_end, 2.0);
        assert_eq!(config.kinetics, KineticParams::new(7.0, 1.5));
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(Cli::try_parse_from(["abc-simulator", "simulate", "--format", "xml"]).is_err());
    }
}
