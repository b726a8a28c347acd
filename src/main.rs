//! # echem-fit
//!
//! Command-line driver for the fitting library.
//!
//! ## Usage
//!
//! ```bash
//! # ECSA from a scan-rate family at 0.15 V
//! echem-fit ecsa --scan 5=cv_5.csv --scan 20=cv_20.csv --scan 50=cv_50.csv --potential 0.15
//!
//! # Tafel slope of an LSV, Bayesian
//! echem-fit tafel lsv.txt --method bayesian --ph 14 --ru 120 --e-min -0.45 --e-max -0.25
//!
//! # Faradaic efficiency with a fitted calibration line
//! echem-fit fe --signal 0.0041 --current 10 --current-err 0.1 --calibration cal.csv --area 0.5
//! ```
//!
//! Results are printed as JSON. `-c config.toml` supplies defaults that
//! flags override.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::fs::File;
use std::path::{Path, PathBuf};

use echem_fit::config::AnalysisConfig;
use echem_fit::ecsa::calculate_ecsa_with;
use echem_fit::faradaic::{fit_calibration, Calibration};
use echem_fit::io;
use echem_fit::tafel::{fit_tafel, prepare_tafel_data, TafelMethod};
use echem_fit::uncertainty::Measurement;

#[derive(Parser)]
#[command(name = "echem-fit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// TOML configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Electrochemical surface area from double-layer capacitance
    Ecsa {
        /// Scan as RATE=FILE, rate in mV/s (repeat for each scan)
        #[arg(short, long = "scan", value_name = "RATE=FILE", value_parser = parse_scan, required = true)]
        scans: Vec<(f64, PathBuf)>,

        /// Contour potential (V)
        #[arg(short, long, allow_hyphen_values = true)]
        potential: Option<f64>,

        /// Specific capacitance to divide by
        #[arg(long)]
        specific_capacitance: Option<f64>,

        /// Capacitance of the bare substrate
        #[arg(long)]
        blank_capacitance: Option<f64>,

        /// Scan rate to leave out (repeatable)
        #[arg(long = "exclude", value_name = "RATE")]
        exclude: Vec<f64>,

        /// Cycle to keep from each file
        #[arg(long)]
        cycle: Option<i64>,

        /// Write the contour table here
        #[arg(long, value_name = "FILE")]
        contour_csv: Option<PathBuf>,

        /// Write the branch fits here
        #[arg(long, value_name = "FILE")]
        fits_csv: Option<PathBuf>,
    },

    /// Tafel slope of a polarization curve
    Tafel {
        /// Polarization curve (potential, current[, cycle])
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// least_squares or bayesian
        #[arg(short, long)]
        method: Option<TafelMethod>,

        #[arg(long)]
        ph: Option<f64>,

        /// Uncompensated resistance (mOhm)
        #[arg(long)]
        ru: Option<f64>,

        /// Surface area the current is divided by
        #[arg(long)]
        area: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        e_min: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        e_max: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        log_i_min: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        log_i_max: Option<f64>,

        #[arg(long)]
        cycle: Option<i64>,

        /// Observation noise for the Bayesian fit (log10 units)
        #[arg(long)]
        sigma: Option<f64>,

        /// Posterior draws per chain
        #[arg(long)]
        nsamples: Option<usize>,

        /// Sampler attempts
        #[arg(long)]
        retries: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,

        /// Write the fit curve here
        #[arg(long, value_name = "FILE")]
        curve_csv: Option<PathBuf>,
    },

    /// Faradaic efficiency of a product
    Fe {
        /// Detector signal of the product
        #[arg(long)]
        signal: f64,

        #[arg(long, default_value = "0")]
        signal_err: f64,

        /// Average cell current (mA)
        #[arg(long)]
        current: Option<f64>,

        #[arg(long)]
        current_err: Option<f64>,

        /// Calibration points (current, signal[, current_err]) to fit
        #[arg(long, value_name = "FILE", conflicts_with = "cal_slope")]
        calibration: Option<PathBuf>,

        #[arg(long)]
        cal_slope: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        cal_intercept: Option<f64>,

        /// Electrode area (cm²); adds partial current and partial current density
        #[arg(long)]
        area: Option<f64>,
    },
}

fn parse_scan(s: &str) -> std::result::Result<(f64, PathBuf), String> {
    let (rate, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected RATE=FILE, got '{}'", s))?;
    let rate = rate
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid scan rate '{}': {}", rate, e))?;
    Ok((rate, PathBuf::from(path)))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match &cli.config {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("Failed to read configuration {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    match cli.command {
        Commands::Ecsa {
            scans,
            potential,
            specific_capacitance,
            blank_capacitance,
            exclude,
            cycle,
            contour_csv,
            fits_csv,
        } => {
            let mut ecsa = config.ecsa;
            ecsa.contour_potential = potential.or(ecsa.contour_potential);
            if let Some(c) = specific_capacitance {
                ecsa.specific_capacitance = c;
            }
            if let Some(c) = blank_capacitance {
                ecsa.blank_capacitance = c;
            }
            ecsa.exclude_rates.extend(exclude);
            ecsa.cycle = cycle.or(ecsa.cycle);

            let Some(contour_potential) = ecsa.contour_potential else {
                bail!("A contour potential is required (--potential or [ecsa] contour_potential)");
            };
            let family = io::load_scan_family(&scans, ecsa.cycle).context("Failed to load scans")?;
            info!("Loaded {} scans", family.len());

            let result = calculate_ecsa_with(&family, contour_potential, &ecsa.options())
                .context("ECSA calculation failed")?;
            if let Some(path) = contour_csv {
                io::write_contour_table(create(&path)?, &result.contour_table)?;
            }
            if let Some(path) = fits_csv {
                io::write_branch_fits(create(&path)?, &result.branch_fits)?;
            }
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Tafel {
            input,
            method,
            ph,
            ru,
            area,
            e_min,
            e_max,
            log_i_min,
            log_i_max,
            cycle,
            sigma,
            nsamples,
            retries,
            seed,
            curve_csv,
        } => {
            let mut tafel = config.tafel;
            tafel.method = method.unwrap_or(tafel.method);
            tafel.ph = ph.unwrap_or(tafel.ph);
            tafel.ru = ru.unwrap_or(tafel.ru);
            tafel.surface_area = area.unwrap_or(tafel.surface_area);
            tafel.cycle = cycle.or(tafel.cycle);
            tafel.potential_window = merge_window(tafel.potential_window, e_min, e_max);
            tafel.log_current_window = merge_window(tafel.log_current_window, log_i_min, log_i_max);
            let bayesian = &mut tafel.bayesian;
            bayesian.sigma = sigma.unwrap_or(bayesian.sigma);
            bayesian.nsamples = nsamples.unwrap_or(bayesian.nsamples);
            bayesian.retries = retries.unwrap_or(bayesian.retries);
            bayesian.seed = seed.unwrap_or(bayesian.seed);

            let trace = io::load_trace(&input, tafel.cycle)
                .with_context(|| format!("Failed to load {}", input.display()))?;
            let data = prepare_tafel_data(trace.potential(), trace.current(), &tafel.preparation())
                .context("Failed to prepare Tafel data")?;
            info!("Fitting {} points by {:?}", data.len(), tafel.method);
            let result = fit_tafel(&data, tafel.method, &tafel.bayesian).context("Tafel fit failed")?;

            if let Some(path) = curve_csv {
                io::write_fit_curve(create(&path)?, &result.fit_potential, &result.fit_log_current)?;
            }
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Fe {
            signal,
            signal_err,
            current,
            current_err,
            calibration,
            cal_slope,
            cal_intercept,
            area,
        } => {
            let fe_config = config.faradaic;
            let Some(current) = current.or(fe_config.avg_current) else {
                bail!("An average current is required (--current or [faradaic] avg_current)");
            };
            let avg_current = Measurement::new(current, current_err.unwrap_or(fe_config.avg_current_err));
            let signal = Measurement::new(signal, signal_err);

            let cal = if let Some(path) = calibration {
                let points = io::load_calibration(&path)
                    .with_context(|| format!("Failed to load {}", path.display()))?;
                let (cal, fit) =
                    fit_calibration(&points.current, &points.signal, points.current_err.as_deref())
                        .context("Calibration fit failed")?;
                info!("Calibration reduced chi-square {:.4}", fit.reduced_chi_square);
                cal
            } else {
                let Some(slope) = cal_slope.or(fe_config.cal_slope) else {
                    bail!("A calibration is required (--calibration or --cal-slope)");
                };
                Calibration::exact(slope, cal_intercept.unwrap_or(fe_config.cal_intercept))
            };

            if let Some(area) = area {
                let product = cal.analyze_product(signal, avg_current, area)?;
                println!("{}", serde_json::to_string_pretty(&product)?);
            } else {
                let efficiency = cal.efficiency(signal, avg_current)?;
                println!("{}", serde_json::to_string_pretty(&efficiency)?);
            }
        }
    }

    Ok(())
}

fn create(path: &Path) -> Result<File> {
    File::create(path).with_context(|| format!("Failed to create {}", path.display()))
}

/// Override either end of a window from the command line.
fn merge_window(base: Option<(f64, f64)>, lo: Option<f64>, hi: Option<f64>) -> Option<(f64, f64)> {
    match (base, lo, hi) {
        (base, None, None) => base,
        (Some((b_lo, b_hi)), lo, hi) => Some((lo.unwrap_or(b_lo), hi.unwrap_or(b_hi))),
        (None, lo, hi) => Some((lo.unwrap_or(f64::NEG_INFINITY), hi.unwrap_or(f64::INFINITY))),
    }
}
