// src/recorder.rs
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use log::info;

use crate::debug_log::iso_timestamp;
use crate::service::DashboardError;

/// `flight_YYYYMMDD_HHMMSS.csv`, from local wall-clock time.
pub fn flight_filename(at: NaiveDateTime) -> String {
    at.format("flight_%Y%m%d_%H%M%S.csv").to_string()
}

/// `debug_2024-05-01T12-00-00-000Z.log`
pub fn debug_log_filename(at: DateTime<Utc>) -> String {
    format!("debug_{}.log", iso_timestamp(at).replace(&[':', '.'][..], "-"))
}

/// Writes an export to `dir/filename`, creating `dir` if needed.
pub fn save_text(dir: &Path, filename: &str, contents: &str) -> Result<PathBuf, DashboardError> {
    if contents.is_empty() {
        return Err(DashboardError::NoData);
    }
    fs::create_dir_all(dir)?;
    let path = dir.join(filename);
    let mut w = BufWriter::new(File::create(&path)?);
    w.write_all(contents.as_bytes())?;
    w.flush()?;
    info!("saved {} bytes to {}", contents.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn scratch_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("robd2-recorder-{}-{}", tag, std::process::id()))
    }

    #[test]
    fn filenames() {
        let local = NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(9, 5, 7))
            .unwrap();
        assert_eq!(flight_filename(local), "flight_20240501_090507.csv");
        let utc = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(debug_log_filename(utc), "debug_2024-05-01T12-00-00-000Z.log");
    }

    #[test]
    fn save_writes_contents() {
        let dir = scratch_dir("save");
        let path = save_text(&dir, "out.csv", "a,b\n1,2").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a,b\n1,2");
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn empty_export_is_refused() {
        let dir = scratch_dir("empty");
        assert!(matches!(
            save_text(&dir, "out.csv", ""),
            Err(DashboardError::NoData)
        ));
        assert!(!dir.join("out.csv").exists());
    }
}
