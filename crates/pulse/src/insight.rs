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

use crate::dataset::{
    column, AVG_GLUCOSE, BMI, HEART_DISEASE, HYPERTENSION, SMOKING_STATUS, STROKE,
};
use crate::error::Result;
use indexmap::IndexMap;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Fixed recommendation lines; these carry no computed values.
pub const RECOMMENDATIONS: [&str; 3] = [
    "Encourage regular health check-ups for patients above a certain age.",
    "Focus on preventive measures for patients with hypertension or heart disease.",
    "Promote awareness campaigns about the risks of smoking.",
];

/// Scalar aggregates over the unfiltered table, interpolated into the
/// insight prose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightReport {
    pub avg_glucose: Option<f64>,
    pub avg_bmi: Option<f64>,
    pub modal_smoking: Option<String>,
    pub hypertension_rate: f64,
    pub heart_disease_rate: f64,
    pub stroke_rate: f64,
}

fn mean_pct(df: &DataFrame, name: &str) -> Result<f64> {
    let flags = column(df, name)?.cast(&DataType::Float64)?;
    Ok(flags.f64()?.mean().map(|m| 100.0 * m).unwrap_or(0.0))
}

/// Most frequent non-null label. Ties break towards the label seen
/// first in row order; strictly-greater comparison keeps the winner
/// stable.
fn modal_label(df: &DataFrame, name: &str) -> Result<Option<String>> {
    let labels = column(df, name)?.cast(&DataType::String)?;
    let labels = labels.str()?;
    let mut counts: IndexMap<&str, u32> = IndexMap::new();
    for label in labels.into_iter().flatten() {
        *counts.entry(label).or_insert(0) += 1;
    }
    let mut best: Option<(&str, u32)> = None;
    for (label, count) in counts {
        if best.map(|(_, c)| count > c).unwrap_or(true) {
            best = Some((label, count));
        }
    }
    Ok(best.map(|(label, _)| label.to_string()))
}

fn mean_of(df: &DataFrame, name: &str) -> Result<Option<f64>> {
    let values = column(df, name)?.cast(&DataType::Float64)?;
    Ok(values.f64()?.mean())
}

fn fmt2(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "n/a".to_string(),
    }
}

impl InsightReport {
    pub fn compute(df: &DataFrame) -> Result<Self> {
        Ok(Self {
            avg_glucose: mean_of(df, AVG_GLUCOSE)?,
            avg_bmi: mean_of(df, BMI)?,
            modal_smoking: modal_label(df, SMOKING_STATUS)?,
            hypertension_rate: mean_pct(df, HYPERTENSION)?,
            heart_disease_rate: mean_pct(df, HEART_DISEASE)?,
            stroke_rate: mean_pct(df, STROKE)?,
        })
    }

    pub fn bullet_lines(&self) -> Vec<String> {
        vec![
            format!(
                "The average glucose level across all patients is approximately {}.",
                fmt2(self.avg_glucose)
            ),
            format!(
                "The average BMI across all patients is approximately {}.",
                fmt2(self.avg_bmi)
            ),
            format!(
                "The most common smoking status among patients is {}.",
                self.modal_smoking.as_deref().unwrap_or("unknown")
            ),
            format!(
                "The percentage of patients with hypertension is approximately {:.2}%.",
                self.hypertension_rate
            ),
            format!(
                "The percentage of patients with heart disease is approximately {:.2}%.",
                self.heart_disease_rate
            ),
            format!(
                "The stroke rate among patients is approximately {:.2}%.",
                self.stroke_rate
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> DataFrame {
        df!(
            AVG_GLUCOSE => [100.0, 110.0, 90.0, 100.0],
            BMI => [Some(20.0), Some(30.0), None, Some(25.0)],
            SMOKING_STATUS => ["Smokes", "Never Smoked", "Smokes", "Never Smoked"],
            HYPERTENSION => [1i64, 0, 0, 0],
            HEART_DISEASE => [0i64, 0, 0, 0],
            STROKE => [1i64, 1, 0, 0],
        )
        .unwrap()
    }

    #[test]
    fn rates_are_percentages_of_all_rows() {
        let report = InsightReport::compute(&fixture()).unwrap();
        assert_eq!(report.hypertension_rate, 25.0);
        assert_eq!(report.heart_disease_rate, 0.0);
        assert_eq!(report.stroke_rate, 50.0);
        assert_eq!(report.avg_glucose, Some(100.0));
        assert_eq!(report.avg_bmi, Some(25.0));
    }

    #[test]
    fn modal_tie_breaks_to_first_seen_label() {
        let report = InsightReport::compute(&fixture()).unwrap();
        // "Smokes" and "Never Smoked" both occur twice; "Smokes"
        // appears first in row order
        assert_eq!(report.modal_smoking.as_deref(), Some("Smokes"));
    }

    #[test]
    fn bullets_interpolate_two_decimals() {
        let report = InsightReport::compute(&fixture()).unwrap();
        let lines = report.bullet_lines();
        assert_eq!(lines.len(), 6);
        assert_eq!(
            lines[0],
            "The average glucose level across all patients is approximately 100.00."
        );
        assert_eq!(
            lines[3],
            "The percentage of patients with hypertension is approximately 25.00%."
        );
    }
}
