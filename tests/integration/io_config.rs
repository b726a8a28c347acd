use std::fs;
use std::path::PathBuf;

use approx::assert_relative_eq;
use echem_fit::config::AnalysisConfig;
use echem_fit::ecsa::calculate_ecsa_with;
use echem_fit::io::{load_scan_family, read_trace, write_branch_fits, write_contour_table};
use echem_fit::tafel::{fit_tafel, prepare_tafel_data};

use crate::test_helpers::capacitive_cv;

/// Scratch directory unique to this test process and test name.
fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("echem-fit-{}-{}", std::process::id(), name));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_ecsa_from_files_and_config() {
    let dir = scratch("ecsa");
    let mut scans = Vec::new();
    for rate in [10.0, 25.0, 50.0, 100.0] {
        let trace = capacitive_cv(rate, 0.3, 0.0, 0.0, 0.4, 21);
        let mut text = String::from("Potential (V)\tCurrent (mA)\tCycle\n");
        for (e, i) in trace.potential().iter().zip(trace.current()) {
            text.push_str(&format!("{}\t{}\t1\n", e, i));
        }
        // a second cycle the loader should ignore
        text.push_str("0.2\t999.0\t2\n0.1\t999.0\t2\n");
        let path = dir.join(format!("cv_{}.txt", rate));
        fs::write(&path, text).unwrap();
        scans.push((rate, path));
    }
    let config_path = dir.join("analysis.toml");
    fs::write(
        &config_path,
        "[ecsa]\ncontour_potential = 0.2\nspecific_capacitance = 0.04\ncycle = 1\n",
    )
    .unwrap();

    let config = AnalysisConfig::from_file(&config_path).unwrap();
    let family = load_scan_family(&scans, config.ecsa.cycle).unwrap();
    let potential = config.ecsa.contour_potential.unwrap();
    let result = calculate_ecsa_with(&family, potential, &config.ecsa.options()).unwrap();
    assert_relative_eq!(result.value, 0.3 / 0.04, epsilon = 1e-6);

    let mut out = Vec::new();
    write_contour_table(&mut out, &result.contour_table).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), 5);
    assert!(text.starts_with("scan_rate,current_low,current_high\n10.0,"));

    let mut out = Vec::new();
    write_branch_fits(&mut out, &result.branch_fits).unwrap();
    let text = String::from_utf8(out).unwrap();
    let rows: Vec<&str> = text.lines().collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[0].starts_with("branch,slope,slope_stderr"));
    assert!(rows[1].starts_with("low,") && rows[2].starts_with("high,"));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_tafel_from_text_and_config() {
    let mut text = String::from("E,I\n");
    for k in 0..15 {
        let e = -0.30 - 0.01 * k as f64;
        let i = -(10f64).powf(-(e + 0.25) / 0.11);
        text.push_str(&format!("{},{}\n", e, i));
    }
    let trace = read_trace(text.as_bytes(), None).unwrap();
    let config = AnalysisConfig::from_toml_str(
        "[tafel]\nph = 0.0\nreference_offset = 0.0\nsurface_area = 0.5\n",
    )
    .unwrap();

    let data = prepare_tafel_data(trace.potential(), trace.current(), &config.tafel.preparation()).unwrap();
    assert_eq!(data.len(), 15);
    assert_relative_eq!(data.potential[0], -0.30, epsilon = 1e-12);
    let result = fit_tafel(&data, config.tafel.method, &config.tafel.bayesian).unwrap();
    assert_relative_eq!(result.slope_mv_per_decade, 110.0, epsilon = 1e-4);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["method"], "least_squares");
    assert_eq!(json["diagnostic"]["method"], "least_squares");
}
