//! Delimited-text trace loading and CSV export of result tables.
//!
//! Input files have one header row and columns potential (V), current (mA)
//! and an optional integer cycle index. The delimiter is a tab when the
//! header contains one and a comma otherwise.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

use serde::Serialize;

use crate::contour::ContourTable;
use crate::ecsa::BranchFits;
use crate::error::{EchemError, Result};
use crate::regression::FitResult;
use crate::trace::{ScanFamily, Trace};

/// Delimiter guessed from the header line.
pub fn detect_delimiter(header: &str) -> u8 {
    if header.contains('\t') {
        b'\t'
    } else {
        b','
    }
}

/// Read a trace, keeping only `cycle` when one is given.
pub fn read_trace<R: Read>(reader: R, cycle: Option<i64>) -> Result<Trace> {
    let mut reader = BufReader::new(reader);
    let mut header = String::new();
    reader.read_line(&mut header)?;
    if header.trim().is_empty() {
        return Err(EchemError::InputShape("trace file is empty".to_string()));
    }
    let delimiter = detect_delimiter(&header);

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut potential = Vec::new();
    let mut current = Vec::new();
    let mut cycles = Vec::new();
    for (row, record) in csv_reader.records().enumerate() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        // header is line 1
        let line = row + 2;
        if record.len() < 2 {
            return Err(EchemError::InputShape(format!(
                "line {}: expected at least 2 columns, got {}",
                line,
                record.len()
            )));
        }
        potential.push(parse_number(&record[0], line)?);
        current.push(parse_number(&record[1], line)?);
        if let Some(field) = record.get(2).filter(|f| !f.is_empty()) {
            cycles.push(parse_cycle(field, line)?);
        }
    }

    let n = potential.len();
    let trace = Trace::new(potential, current)?;
    let trace = if cycles.len() == n {
        trace.with_cycles(cycles)?
    } else if cycles.is_empty() {
        trace
    } else {
        return Err(EchemError::InputShape(format!(
            "cycle column has {} values for {} rows",
            cycles.len(),
            n
        )));
    };

    match cycle {
        Some(c) => trace.select_cycle(c),
        None => Ok(trace),
    }
}

pub fn load_trace<P: AsRef<Path>>(path: P, cycle: Option<i64>) -> Result<Trace> {
    let path = path.as_ref();
    log::debug!("loading trace from {}", path.display());
    read_trace(File::open(path)?, cycle)
}

/// Load one trace per `(scan_rate, path)` entry, in the given order.
pub fn load_scan_family<P: AsRef<Path>>(entries: &[(f64, P)], cycle: Option<i64>) -> Result<ScanFamily> {
    let mut family = ScanFamily::new();
    for (rate, path) in entries {
        family.insert(*rate, load_trace(path, cycle)?)?;
    }
    Ok(family)
}

fn parse_number(field: &str, line: usize) -> Result<f64> {
    field.parse::<f64>().map_err(|_| {
        EchemError::InputShape(format!("line {}: '{}' is not a number", line, field))
    })
}

fn parse_cycle(field: &str, line: usize) -> Result<i64> {
    if let Ok(c) = field.parse::<i64>() {
        return Ok(c);
    }
    // some instruments write the cycle as a float
    match field.parse::<f64>() {
        Ok(c) if c.fract() == 0.0 && c.is_finite() => Ok(c as i64),
        _ => Err(EchemError::InputShape(format!(
            "line {}: cycle '{}' is not an integer",
            line, field
        ))),
    }
}

/// Calibration points: signal against current, with optional current errors.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationPoints {
    pub current: Vec<f64>,
    pub signal: Vec<f64>,
    pub current_err: Option<Vec<f64>>,
}

/// Read calibration points from columns current, signal and an optional
/// current error, after one header row.
pub fn read_calibration<R: Read>(reader: R) -> Result<CalibrationPoints> {
    let mut reader = BufReader::new(reader);
    let mut header = String::new();
    reader.read_line(&mut header)?;
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(&header))
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut points = CalibrationPoints {
        current: Vec::new(),
        signal: Vec::new(),
        current_err: None,
    };
    let mut errors = Vec::new();
    for (row, record) in csv_reader.records().enumerate() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line = row + 2;
        if record.len() < 2 {
            return Err(EchemError::InputShape(format!(
                "line {}: expected current and signal columns",
                line
            )));
        }
        points.current.push(parse_number(&record[0], line)?);
        points.signal.push(parse_number(&record[1], line)?);
        if let Some(field) = record.get(2).filter(|f| !f.is_empty()) {
            errors.push(parse_number(field, line)?);
        }
    }

    if !errors.is_empty() {
        crate::error::ensure_same_len("current errors and current", errors.len(), points.current.len())?;
        points.current_err = Some(errors);
    }
    Ok(points)
}

pub fn load_calibration<P: AsRef<Path>>(path: P) -> Result<CalibrationPoints> {
    read_calibration(File::open(path)?)
}

/// Write the contour table as `scan_rate,current_low,current_high`.
pub fn write_contour_table<W: Write>(writer: W, table: &ContourTable) -> Result<()> {
    let mut w = csv::Writer::from_writer(writer);
    for row in &table.rows {
        w.serialize(row)?;
    }
    w.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct FitRow<'a> {
    branch: &'a str,
    slope: f64,
    slope_stderr: f64,
    intercept: f64,
    intercept_stderr: f64,
    r_squared: f64,
    reduced_chi_square: f64,
    ndata: usize,
}

impl<'a> FitRow<'a> {
    fn new(branch: &'a str, fit: &FitResult) -> Self {
        Self {
            branch,
            slope: fit.slope,
            slope_stderr: fit.slope_stderr,
            intercept: fit.intercept,
            intercept_stderr: fit.intercept_stderr,
            r_squared: fit.r_squared,
            reduced_chi_square: fit.reduced_chi_square,
            ndata: fit.ndata,
        }
    }
}

/// Write one row per branch line fit.
pub fn write_branch_fits<W: Write>(writer: W, fits: &BranchFits) -> Result<()> {
    let mut w = csv::Writer::from_writer(writer);
    w.serialize(FitRow::new("low", &fits.low))?;
    w.serialize(FitRow::new("high", &fits.high))?;
    w.flush()?;
    Ok(())
}

/// Write a fit curve as `potential,log_current`.
pub fn write_fit_curve<W: Write>(writer: W, potential: &[f64], log_current: &[f64]) -> Result<()> {
    crate::error::ensure_same_len("potential and log current", potential.len(), log_current.len())?;
    let mut w = csv::Writer::from_writer(writer);
    w.write_record(["potential", "log_current"])?;
    for (e, l) in potential.iter().zip(log_current) {
        w.write_record([e.to_string(), l.to_string()])?;
    }
    w.flush()?;
    Ok(())
}
