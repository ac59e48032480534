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

pub mod charts;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod insight;
pub mod summary;

pub use dataset::{load_dataset, DatasetCache};
pub use error::{DataError, ErrorReporter, ErrorSeverity, FilterError, PulseError, Result};
pub use filter::{age_bounds, distinct_labels, FilterParams};
pub use insight::{InsightReport, RECOMMENDATIONS};
pub use summary::KpiSummary;

use polars::prelude::DataFrame;
use std::path::Path;

/// The loaded survey table plus the read paths the dashboard needs.
/// The table is loaded once and treated as read-only; every filtered
/// view is a fresh frame.
pub struct Dashboard {
    df: DataFrame,
}

impl Dashboard {
    pub fn load(cache: &mut DatasetCache, path: &Path) -> Result<Self> {
        let df = cache.load(path)?;
        Ok(Self { df })
    }

    pub fn from_frame(df: DataFrame) -> Self {
        Self { df }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    /// Default sidebar selection derived from the data.
    pub fn default_filters(&self) -> Result<FilterParams> {
        Ok(FilterParams::all_of(&self.df)?)
    }

    pub fn filtered(&self, params: &FilterParams) -> Result<DataFrame> {
        params.apply(&self.df)
    }

    /// KPI cards; always over the unfiltered table.
    pub fn kpis(&self) -> Result<KpiSummary> {
        KpiSummary::compute(&self.df)
    }

    /// Insight aggregates; always over the unfiltered table.
    pub fn insight(&self) -> Result<InsightReport> {
        InsightReport::compute(&self.df)
    }
}
