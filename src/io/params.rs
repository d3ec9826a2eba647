//! Parameter files and JSON artifacts.
//!
//! A parameter file is a single `ModelParams` object in model notation:
//!
//! ```json
//! { "b_0": 2.2, "b_M": 2.2, "d_0": 3.0, "d_M": 1.0,
//!   "r_um": 0.2, "r_mu": 0.2, "p": 1.0, "M": 4 }
//! ```
//!
//! Optional keys (`r_um_m`, `r_mu_u`, `degree`, `c`) are only required by the
//! rate families that use them.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;

use crate::domain::ModelParams;
use crate::error::AppError;

/// Read a parameter record from a JSON file.
pub fn read_params_json(path: &Path) -> Result<ModelParams, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(4, format!("Failed to open params JSON '{}': {e}", path.display())))?;
    let params: ModelParams =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid params JSON: {e}")))?;
    Ok(params)
}

/// Write any serializable result as pretty JSON.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .map_err(|e| AppError::new(4, format!("Failed to write JSON: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("methyl-{}-{name}", std::process::id()))
    }

    #[test]
    fn params_survive_a_file_trip() {
        let path = temp_path("params.json");
        let mut params = ModelParams::uniform(10, 1.5, 2.0, 1.0, 0.2, 0.1, 0.9);
        params.c = Some(0.3);
        write_json(&path, &params).unwrap();
        let back = read_params_json(&path).unwrap();
        assert_eq!(back, params);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_params_json(Path::new("/definitely/not/here.json")).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let path = temp_path("bad.json");
        std::fs::write(&path, "{\"b_0\": 1.0}").unwrap();
        let err = read_params_json(&path).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        let _ = std::fs::remove_file(&path);
    }
}
