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

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PulseError {
    #[error("Dataset error: {0}")]
    Data(#[from] DataError),
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialisation error: {source}")]
    Serialisation {
        #[from]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to read data file '{path}': {source}")]
    DataFileError {
        path: String,
        #[source]
        source: polars::error::PolarsError,
    },
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
    #[error("Unexpected schema: expected {expected} columns, found {found}")]
    SchemaMismatch { expected: usize, found: usize },
    #[error("Column '{column}' not found in dataset")]
    ColumnNotFound { column: String },
    #[error("Empty dataset loaded from '{path}'")]
    EmptyDataset { path: String },
}

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid age range: min {min} exceeds max {max}")]
    InvalidAgeRange { min: i64, max: i64 },
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl From<polars::error::PolarsError> for PulseError {
    fn from(source: polars::error::PolarsError) -> Self {
        PulseError::Data(DataError::Polars(source))
    }
}

pub type Result<T> = std::result::Result<T, PulseError>;
pub type DataResult<T> = std::result::Result<T, DataError>;
pub type FilterResult<T> = std::result::Result<T, FilterError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Warning,
    Error,
    Fatal,
}

impl ErrorSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSeverity::Warning => "WARNING",
            ErrorSeverity::Error => "ERROR",
            ErrorSeverity::Fatal => "FATAL",
        }
    }
}

impl PulseError {
    /// Load-time failures are fatal to startup; everything else is
    /// tolerated at render time.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PulseError::Data(_) | PulseError::Io(_) => ErrorSeverity::Fatal,
            PulseError::Filter(_) => ErrorSeverity::Warning,
            PulseError::Serialisation { .. } => ErrorSeverity::Error,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            PulseError::Data(_) => "Data",
            PulseError::Filter(_) => "Filter",
            PulseError::Io(_) => "I/O",
            PulseError::Serialisation { .. } => "Serialisation",
        }
    }

    pub fn suggestions(&self) -> Vec<String> {
        match self {
            PulseError::Data(DataError::DataFileError { .. })
            | PulseError::Data(DataError::Io(_))
            | PulseError::Io(_) => vec![
                "Check that the survey CSV exists at the given path".to_string(),
                "Pass an explicit path as the first argument".to_string(),
            ],
            PulseError::Data(DataError::SchemaMismatch { .. }) => vec![
                "The loader expects the 12-column cleaned survey export".to_string(),
                "Column names in the file are ignored; order matters".to_string(),
            ],
            _ => Vec::new(),
        }
    }
}

pub struct ErrorReporter {
    pub show_suggestions: bool,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            show_suggestions: true,
        }
    }

    pub fn report(&self, error: &PulseError) -> String {
        let mut output = format!(
            "[{}] {}: {}\n",
            error.severity().as_str(),
            error.category(),
            error
        );
        if self.show_suggestions {
            let suggestions = error.suggestions();
            if !suggestions.is_empty() {
                output.push_str("\nSuggestions:\n");
                for suggestion in suggestions {
                    output.push_str(&format!("  • {suggestion}\n"));
                }
            }
        }
        output
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}
