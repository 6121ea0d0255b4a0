//! Survival CSV schema contract.
//!
//! The survival container joins its input on `slideID` against the
//! detection output (`prediction-<slideID>` files) and reads the
//! survival time and censoring indicator from two fixed columns. Column
//! names are bit-exact; a header violation is caught here before any
//! stage runs.

use crate::error::{InputRole, PipelineError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub const SLIDE_ID_COLUMN: &str = "slideID";
pub const SURVIVAL_TIME_COLUMN: &str = "survivalA";
pub const CENSOR_COLUMN: &str = "censorA.0yes.1no";

const REQUIRED_COLUMNS: [&str; 3] = [SLIDE_ID_COLUMN, SURVIVAL_TIME_COLUMN, CENSOR_COLUMN];

/// Check that the CSV exists and its header carries the required columns.
pub fn validate_header(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(PipelineError::InputMissing {
            role: InputRole::SurvivalCsv,
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path).map_err(|e| PipelineError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut header = String::new();
    BufReader::new(file)
        .read_line(&mut header)
        .map_err(|e| PipelineError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

    let columns: Vec<&str> = header.trim_end().split(',').map(str::trim).collect();
    for required in REQUIRED_COLUMNS {
        if !columns.iter().any(|c| *c == required) {
            return Err(PipelineError::CsvSchema {
                path: path.to_path_buf(),
                column: required.to_string(),
            });
        }
    }
    Ok(())
}
