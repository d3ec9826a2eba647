//! Export results to CSV (or JSON, by file extension).
//!
//! CSV is the long/tidy layout spreadsheets and plotting scripts expect: one
//! row per state (or per timepoint), plain column names.

use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::domain::{ExtinctionSolution, LimitCurve, QuasistationaryDistribution, Trajectory};
use crate::error::AppError;
use crate::io::params::write_json;
use crate::report::ExtinctionRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// `.json` means JSON; anything else is CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ExportFormat::Json,
            _ => ExportFormat::Csv,
        }
    }
}

fn csv_writer(path: &Path) -> Result<csv::Writer<File>, AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    Ok(csv::Writer::from_writer(file))
}

fn csv_err(e: csv::Error) -> AppError {
    AppError::new(4, format!("Failed to write export CSV: {e}"))
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), AppError> {
    let mut wtr = csv_writer(path)?;
    for row in rows {
        wtr.serialize(row).map_err(csv_err)?;
    }
    wtr.flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

/// `t, n_0, ..., n_M, total` per timepoint.
pub fn write_trajectory(path: &Path, traj: &Trajectory) -> Result<(), AppError> {
    if ExportFormat::from_path(path) == ExportFormat::Json {
        return write_json(path, traj);
    }

    let states = traj.populations.first().map_or(0, Vec::len);
    let mut wtr = csv_writer(path)?;
    let mut header = vec!["t".to_string()];
    header.extend((0..states).map(|i| format!("n_{i}")));
    header.push("total".to_string());
    wtr.write_record(&header).map_err(csv_err)?;

    for (t, row) in traj.timepoints.iter().zip(&traj.populations) {
        let mut record = vec![format!("{t}")];
        record.extend(row.iter().map(|v| format!("{v}")));
        record.push(format!("{}", row.iter().sum::<f64>()));
        wtr.write_record(&record).map_err(csv_err)?;
    }
    wtr.flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

/// One row per state: analytic probability plus Monte Carlo columns when present.
pub fn write_extinction(path: &Path, solution: &ExtinctionSolution, rows: &[ExtinctionRow]) -> Result<(), AppError> {
    #[derive(Serialize)]
    struct ExtinctionFile<'a> {
        solution: &'a ExtinctionSolution,
        rows: &'a [ExtinctionRow],
    }

    match ExportFormat::from_path(path) {
        ExportFormat::Json => write_json(path, &ExtinctionFile { solution, rows }),
        ExportFormat::Csv => write_rows(path, rows),
    }
}

/// `fraction, probability` pairs.
pub fn write_limit_curve(path: &Path, curve: &LimitCurve) -> Result<(), AppError> {
    #[derive(Serialize)]
    struct Point {
        fraction: f64,
        probability: f64,
    }

    if ExportFormat::from_path(path) == ExportFormat::Json {
        return write_json(path, curve);
    }
    let rows: Vec<Point> = curve
        .points
        .iter()
        .map(|&(fraction, probability)| Point { fraction, probability })
        .collect();
    write_rows(path, &rows)
}

/// `state, fraction, weight` rows; the growth rate only survives in JSON.
pub fn write_quasistationary(path: &Path, qsd: &QuasistationaryDistribution) -> Result<(), AppError> {
    #[derive(Serialize)]
    struct Row {
        state: usize,
        fraction: f64,
        weight: f64,
    }

    if ExportFormat::from_path(path) == ExportFormat::Json {
        return write_json(path, qsd);
    }
    let sites = qsd.distribution.len().saturating_sub(1).max(1);
    let rows: Vec<Row> = qsd
        .distribution
        .iter()
        .enumerate()
        .map(|(state, &weight)| Row {
            state,
            fraction: state as f64 / sites as f64,
            weight,
        })
        .collect();
    write_rows(path, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("methyl-export-{}-{name}", std::process::id()))
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(ExportFormat::from_path(Path::new("out.JSON")), ExportFormat::Json);
        assert_eq!(ExportFormat::from_path(Path::new("out.csv")), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_path(Path::new("out")), ExportFormat::Csv);
    }

    #[test]
    fn trajectory_csv_layout() {
        let path = temp_path("traj.csv");
        let traj = Trajectory {
            timepoints: vec![0.0, 0.5],
            populations: vec![vec![1.0, 2.0], vec![0.0, 4.0]],
        };
        write_trajectory(&path, &traj).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "t,n_0,n_1,total");
        assert_eq!(lines[1], "0,1,2,3");
        assert_eq!(lines[2], "0.5,0,4,4");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn limit_curve_csv_has_one_row_per_point() {
        let path = temp_path("limit.csv");
        let curve = LimitCurve {
            critical_fraction: 0.5,
            critical_probability: 0.9,
            points: vec![(0.0, 1.0), (0.5, 0.9), (1.0, 0.6)],
        };
        write_limit_curve(&path, &curve).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().next(), Some("fraction,probability"));
        assert_eq!(text.lines().count(), 4);
        let _ = std::fs::remove_file(&path);
    }
}
