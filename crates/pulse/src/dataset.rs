// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use crate::error::{DataError, DataResult};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};

pub const ID: &str = "ID";
pub const GENDER: &str = "Gender";
pub const AGE: &str = "Age";
pub const HYPERTENSION: &str = "Hypertension";
pub const HEART_DISEASE: &str = "Heart Disease";
pub const EVER_MARRIED: &str = "Ever Married";
pub const WORK_TYPE: &str = "Work Type";
pub const RESIDENCE_TYPE: &str = "Residence Type";
pub const AVG_GLUCOSE: &str = "Avg Glucose Level";
pub const BMI: &str = "BMI";
pub const SMOKING_STATUS: &str = "Smoking Status";
pub const STROKE: &str = "Stroke";

/// Positional schema of the cleaned survey export. Header names in the
/// file itself are ignored.
pub const COLUMN_NAMES: [&str; 12] = [
    ID,
    GENDER,
    AGE,
    HYPERTENSION,
    HEART_DISEASE,
    EVER_MARRIED,
    WORK_TYPE,
    RESIDENCE_TYPE,
    AVG_GLUCOSE,
    BMI,
    SMOKING_STATUS,
    STROKE,
];

pub const GENDER_LABELS: [(i64, &str); 2] = [(0, "Female"), (1, "Male")];

pub const WORK_TYPE_LABELS: [(i64, &str); 5] = [
    (0, "Never Worked"),
    (1, "Private"),
    (2, "Self-employed"),
    (3, "Govt Job"),
    (4, "Children"),
];

pub const RESIDENCE_TYPE_LABELS: [(i64, &str); 2] = [(0, "Rural"), (1, "Urban")];

pub const SMOKING_STATUS_LABELS: [(i64, &str); 4] = [
    (0, "Unknown"),
    (1, "Formerly Smoked"),
    (2, "Never Smoked"),
    (3, "Smokes"),
];

fn lookup_label(table: &[(i64, &'static str)], code: i64) -> Option<&'static str> {
    table
        .iter()
        .find(|(candidate, _)| *candidate == code)
        .map(|(_, label)| *label)
}

pub(crate) fn column<'a>(df: &'a DataFrame, name: &str) -> DataResult<&'a Series> {
    df.column(name)
        .map(|c| c.as_materialized_series())
        .map_err(|_| DataError::ColumnNotFound {
            column: name.to_string(),
        })
}

/// Replaces an integer-coded column with its label column. Codes
/// outside the table's domain become nulls rather than errors.
fn remap_codes(df: &mut DataFrame, name: &str, table: &[(i64, &'static str)]) -> DataResult<()> {
    let codes = column(df, name)?.cast(&DataType::Int64)?;
    let codes = codes.i64()?;
    let labels: Vec<Option<&str>> = codes
        .into_iter()
        .map(|code| code.and_then(|c| lookup_label(table, c)))
        .collect();
    df.replace(name, Series::new(name.into(), labels))?;
    Ok(())
}

/// Reads the survey CSV, renames the columns positionally and remaps
/// the four categorical columns to human-readable labels. Any failure
/// here is fatal to startup.
pub fn load_dataset(path: &Path) -> DataResult<DataFrame> {
    let file = File::open(path)?;
    let mut df = CsvReader::new(file)
        .finish()
        .map_err(|source| DataError::DataFileError {
            path: path.display().to_string(),
            source,
        })?;

    if df.width() != COLUMN_NAMES.len() {
        return Err(DataError::SchemaMismatch {
            expected: COLUMN_NAMES.len(),
            found: df.width(),
        });
    }
    df.set_column_names(COLUMN_NAMES)?;

    remap_codes(&mut df, GENDER, &GENDER_LABELS)?;
    remap_codes(&mut df, WORK_TYPE, &WORK_TYPE_LABELS)?;
    remap_codes(&mut df, RESIDENCE_TYPE, &RESIDENCE_TYPE_LABELS)?;
    remap_codes(&mut df, SMOKING_STATUS, &SMOKING_STATUS_LABELS)?;

    if df.height() == 0 {
        return Err(DataError::EmptyDataset {
            path: path.display().to_string(),
        });
    }

    info!(
        rows = df.height(),
        path = %path.display(),
        "survey dataset loaded"
    );
    Ok(df)
}

struct CacheEntry {
    path: PathBuf,
    modified: Option<SystemTime>,
    df: DataFrame,
}

/// Load-once cache keyed by path and file modified time. The cached
/// table is immutable; callers get cheap clones of the Arc-backed
/// columns.
#[derive(Default)]
pub struct DatasetCache {
    slot: Option<CacheEntry>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn file_identity(path: &Path) -> Option<SystemTime> {
        std::fs::metadata(path).and_then(|m| m.modified()).ok()
    }

    pub fn load(&mut self, path: &Path) -> DataResult<DataFrame> {
        let modified = Self::file_identity(path);
        if let Some(entry) = &self.slot {
            if entry.path == path && (modified.is_none() || entry.modified == modified) {
                debug!(path = %path.display(), "dataset cache hit");
                return Ok(entry.df.clone());
            }
        }
        let df = load_dataset(path)?;
        self.slot = Some(CacheEntry {
            path: path.to_path_buf(),
            modified,
            df: df.clone(),
        });
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fixture(rows: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,gender,age,hyp,heart,married,work,res,glucose,bmi,smoking,stroke")
            .unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn loads_and_remaps_labels() {
        let file = write_fixture(&[
            "1,1,45,0,0,1,1,1,105.2,28.1,3,1",
            "2,0,45,1,0,1,2,0,88.0,,2,0",
        ]);
        let df = load_dataset(file.path()).unwrap();
        assert_eq!(df.height(), 2);

        let genders = column(&df, GENDER).unwrap();
        let genders: Vec<Option<&str>> = genders.str().unwrap().into_iter().collect();
        assert_eq!(genders, vec![Some("Male"), Some("Female")]);

        let smoking = column(&df, SMOKING_STATUS).unwrap();
        let smoking: Vec<Option<&str>> = smoking.str().unwrap().into_iter().collect();
        assert_eq!(smoking, vec![Some("Smokes"), Some("Never Smoked")]);

        // the empty BMI field comes through as a null, not an error
        let bmi = column(&df, BMI).unwrap().cast(&DataType::Float64).unwrap();
        assert_eq!(bmi.null_count(), 1);
    }

    #[test]
    fn out_of_domain_code_becomes_null() {
        let file = write_fixture(&["1,7,45,0,0,1,1,1,105.2,28.1,3,1"]);
        let df = load_dataset(file.path()).unwrap();
        let genders = column(&df, GENDER).unwrap();
        let genders: Vec<Option<&str>> = genders.str().unwrap().into_iter().collect();
        assert_eq!(genders, vec![None]);
    }

    #[test]
    fn missing_file_is_fatal() {
        let err = load_dataset(Path::new("/nonexistent/survey.csv")).unwrap_err();
        assert!(matches!(err, DataError::Io(_)));
    }

    #[test]
    fn wrong_column_count_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "a,b,c").unwrap();
        writeln!(file, "1,2,3").unwrap();
        file.flush().unwrap();
        let err = load_dataset(file.path()).unwrap_err();
        assert!(matches!(
            err,
            DataError::SchemaMismatch {
                expected: 12,
                found: 3
            }
        ));
    }

    #[test]
    fn cache_does_not_reread_unchanged_file() {
        let file = write_fixture(&["1,1,45,0,0,1,1,1,105.2,28.1,3,1"]);
        let path = file.path().to_path_buf();
        let mut cache = DatasetCache::new();
        let first = cache.load(&path).unwrap();
        // deleting the backing file proves the second load never
        // touches the filesystem for data
        drop(file);
        std::fs::remove_file(&path).ok();
        let second = cache.load(&path).unwrap();
        assert_eq!(first.height(), second.height());
    }
}
