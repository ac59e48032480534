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

use crate::dataset::{column, AVG_GLUCOSE, BMI, STROKE};
use crate::error::{DataResult, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// The four KPI cards. These are always computed over the unfiltered
/// table; the sidebar filters deliberately do not affect them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub total_patients: usize,
    pub avg_glucose: Option<f64>,
    pub avg_bmi: Option<f64>,
    pub stroke_cases: i64,
}

fn mean_of(df: &DataFrame, name: &str) -> DataResult<Option<f64>> {
    let values = column(df, name)?.cast(&DataType::Float64)?;
    Ok(values.f64()?.mean())
}

impl KpiSummary {
    pub fn compute(df: &DataFrame) -> Result<Self> {
        let strokes = column(df, STROKE)?.cast(&DataType::Int64)?;
        let stroke_cases = strokes.i64()?.sum().unwrap_or(0);
        Ok(Self {
            total_patients: df.height(),
            // nulls (missing BMI readings) are skipped, not errors
            avg_glucose: mean_of(df, AVG_GLUCOSE)?,
            avg_bmi: mean_of(df, BMI)?,
            stroke_cases,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn means_skip_missing_values() {
        let df = df!(
            AVG_GLUCOSE => [100.0, 200.0],
            BMI => [Some(20.0), None],
            STROKE => [1i64, 0],
        )
        .unwrap();
        let kpis = KpiSummary::compute(&df).unwrap();
        assert_eq!(kpis.total_patients, 2);
        assert_eq!(kpis.avg_glucose, Some(150.0));
        assert_eq!(kpis.avg_bmi, Some(20.0));
        assert_eq!(kpis.stroke_cases, 1);
    }
}
