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

//! Aggregations behind the five dashboard charts. Each function is a
//! pure view over the (already filtered) table and returns plot-ready
//! data; an empty table yields empty output rather than an error.

use crate::dataset::{column, AGE, AVG_GLUCOSE, BMI, GENDER, HEART_DISEASE, HYPERTENSION, STROKE};
use crate::error::Result;
use indexmap::IndexMap;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceCount {
    pub label: String,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeOutcomeCount {
    pub age: i64,
    pub no_stroke: u32,
    pub stroke: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionSplit {
    pub hypertension: i64,
    pub heart_disease: i64,
    /// `total − hypertension − heart_disease`. Patients carrying both
    /// flags are subtracted twice, so this can go negative; callers
    /// decide how to present that.
    pub neither: i64,
}

impl ConditionSplit {
    pub fn total(&self) -> i64 {
        self.hypertension + self.heart_disease + self.neither
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgePoint {
    pub age: i64,
    pub mean_glucose: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenderBoxStats {
    pub gender: String,
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

fn ages_floored(df: &DataFrame) -> Result<Vec<Option<i64>>> {
    let ages = column(df, AGE)?.cast(&DataType::Float64)?;
    let ages = ages.f64()?;
    Ok(ages
        .into_iter()
        .map(|age| age.map(|a| a.floor() as i64))
        .collect())
}

fn flag_sum(df: &DataFrame, name: &str) -> Result<i64> {
    let flags = column(df, name)?.cast(&DataType::Int64)?;
    Ok(flags.i64()?.sum().unwrap_or(0))
}

/// Record count per gender label, first-seen order. Feeds the donut.
pub fn gender_distribution(df: &DataFrame) -> Result<Vec<SliceCount>> {
    let genders = column(df, GENDER)?.cast(&DataType::String)?;
    let genders = genders.str()?;
    let mut counts: IndexMap<String, u32> = IndexMap::new();
    for label in genders.into_iter().flatten() {
        *counts.entry(label.to_string()).or_insert(0) += 1;
    }
    Ok(counts
        .into_iter()
        .map(|(label, count)| SliceCount { label, count })
        .collect())
}

/// Stroke outcome counts per (floored) age, ascending. A missing
/// outcome at an age fills as zero.
pub fn stroke_by_age(df: &DataFrame) -> Result<Vec<AgeOutcomeCount>> {
    let ages = ages_floored(df)?;
    let strokes = column(df, STROKE)?.cast(&DataType::Int64)?;
    let strokes = strokes.i64()?;

    let mut groups: BTreeMap<i64, (u32, u32)> = BTreeMap::new();
    for (age, outcome) in ages.iter().zip(strokes.into_iter()) {
        let (Some(age), Some(outcome)) = (age, outcome) else {
            continue;
        };
        let entry = groups.entry(*age).or_insert((0, 0));
        if outcome == 0 {
            entry.0 += 1;
        } else {
            entry.1 += 1;
        }
    }
    Ok(groups
        .into_iter()
        .map(|(age, (no_stroke, stroke))| AgeOutcomeCount {
            age,
            no_stroke,
            stroke,
        })
        .collect())
}

/// Three-way condition split for the second donut. See
/// [`ConditionSplit::neither`] for the preserved subtraction quirk.
pub fn condition_split(df: &DataFrame) -> Result<ConditionSplit> {
    let hypertension = flag_sum(df, HYPERTENSION)?;
    let heart_disease = flag_sum(df, HEART_DISEASE)?;
    Ok(ConditionSplit {
        hypertension,
        heart_disease,
        neither: df.height() as i64 - hypertension - heart_disease,
    })
}

/// Mean glucose per (floored) age, ascending. Null readings are
/// skipped.
pub fn glucose_by_age(df: &DataFrame) -> Result<Vec<AgePoint>> {
    let ages = ages_floored(df)?;
    let glucose = column(df, AVG_GLUCOSE)?.cast(&DataType::Float64)?;
    let glucose = glucose.f64()?;

    let mut groups: BTreeMap<i64, (f64, u32)> = BTreeMap::new();
    for (age, value) in ages.iter().zip(glucose.into_iter()) {
        let (Some(age), Some(value)) = (age, value) else {
            continue;
        };
        let entry = groups.entry(*age).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }
    Ok(groups
        .into_iter()
        .map(|(age, (sum, n))| AgePoint {
            age,
            mean_glucose: sum / n as f64,
        })
        .collect())
}

/// Quantile of a sorted, non-empty slice by linear interpolation
/// between order statistics, the convention plotly uses for quartiles.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let last = sorted.len() - 1;
    let position = q * last as f64;
    let low = position.floor() as usize;
    let high = position.ceil() as usize;
    if low == high {
        sorted[low]
    } else {
        let fraction = position - low as f64;
        sorted[low] + (sorted[high] - sorted[low]) * fraction
    }
}

/// Per-gender five-number BMI summary with 1.5·IQR whiskers clamped
/// to observed values, plus the outliers beyond them. Genders without
/// any BMI reading are dropped.
pub fn bmi_by_gender(df: &DataFrame) -> Result<Vec<GenderBoxStats>> {
    let genders = column(df, GENDER)?.cast(&DataType::String)?;
    let genders = genders.str()?;
    let bmi = column(df, BMI)?.cast(&DataType::Float64)?;
    let bmi = bmi.f64()?;

    let mut groups: IndexMap<String, Vec<f64>> = IndexMap::new();
    for (gender, value) in genders.into_iter().zip(bmi.into_iter()) {
        let (Some(gender), Some(value)) = (gender, value) else {
            continue;
        };
        groups.entry(gender.to_string()).or_default().push(value);
    }

    let mut stats = Vec::with_capacity(groups.len());
    for (gender, mut values) in groups {
        values.sort_by(|a, b| a.total_cmp(b));
        let q1 = quantile_sorted(&values, 0.25);
        let median = quantile_sorted(&values, 0.5);
        let q3 = quantile_sorted(&values, 0.75);
        let iqr = q3 - q1;
        let low_fence = q1 - 1.5 * iqr;
        let high_fence = q3 + 1.5 * iqr;
        let lower_whisker = values
            .iter()
            .copied()
            .find(|v| *v >= low_fence)
            .unwrap_or(q1);
        let upper_whisker = values
            .iter()
            .rev()
            .copied()
            .find(|v| *v <= high_fence)
            .unwrap_or(q3);
        let outliers = values
            .iter()
            .copied()
            .filter(|v| *v < low_fence || *v > high_fence)
            .collect();
        stats.push(GenderBoxStats {
            gender,
            lower_whisker,
            q1,
            median,
            q3,
            upper_whisker,
            outliers,
        });
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> DataFrame {
        df!(
            AGE => [45.0, 45.0, 60.0, 60.0, 60.0],
            GENDER => ["Male", "Female", "Female", "Male", "Male"],
            HYPERTENSION => [1i64, 0, 1, 0, 0],
            HEART_DISEASE => [1i64, 0, 0, 0, 0],
            AVG_GLUCOSE => [100.0, 110.0, 90.0, 100.0, 110.0],
            BMI => [Some(28.0), Some(22.0), Some(24.0), None, Some(30.0)],
            STROKE => [1i64, 0, 0, 0, 1],
        )
        .unwrap()
    }

    fn empty() -> DataFrame {
        fixture().head(Some(0))
    }

    #[test]
    fn gender_counts_in_first_seen_order() {
        let counts = gender_distribution(&fixture()).unwrap();
        assert_eq!(
            counts,
            vec![
                SliceCount {
                    label: "Male".to_string(),
                    count: 3
                },
                SliceCount {
                    label: "Female".to_string(),
                    count: 2
                },
            ]
        );
    }

    #[test]
    fn stroke_counts_partition_each_age_group() {
        let rows = stroke_by_age(&fixture()).unwrap();
        assert_eq!(
            rows,
            vec![
                AgeOutcomeCount {
                    age: 45,
                    no_stroke: 1,
                    stroke: 1
                },
                AgeOutcomeCount {
                    age: 60,
                    no_stroke: 2,
                    stroke: 1
                },
            ]
        );
        // per age, the two outcome counts sum to the rows at that age
        let total: u32 = rows.iter().map(|r| r.no_stroke + r.stroke).sum();
        assert_eq!(total as usize, fixture().height());
    }

    #[test]
    fn condition_split_follows_documented_formula() {
        let split = condition_split(&fixture()).unwrap();
        assert_eq!(split.hypertension, 2);
        assert_eq!(split.heart_disease, 1);
        assert_eq!(split.neither, 5 - 2 - 1);
        assert_eq!(split.total(), 5);
    }

    #[test]
    fn condition_split_neither_can_go_negative() {
        let df = df!(
            HYPERTENSION => [1i64],
            HEART_DISEASE => [1i64],
        )
        .unwrap();
        let split = condition_split(&df).unwrap();
        // one patient with both flags is double-subtracted
        assert_eq!(split.neither, -1);
        assert_eq!(split.total(), 1);
    }

    #[test]
    fn glucose_means_are_age_ascending() {
        let points = glucose_by_age(&fixture()).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].age, 45);
        assert_eq!(points[0].mean_glucose, 105.0);
        assert_eq!(points[1].age, 60);
        assert_eq!(points[1].mean_glucose, 100.0);
    }

    #[test]
    fn quantiles_interpolate_linearly() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_sorted(&values, 0.25), 1.75);
        assert_eq!(quantile_sorted(&values, 0.5), 2.5);
        assert_eq!(quantile_sorted(&values, 0.75), 3.25);
        assert_eq!(quantile_sorted(&[7.0], 0.5), 7.0);
    }

    #[test]
    fn bmi_boxes_skip_missing_values() {
        let stats = bmi_by_gender(&fixture()).unwrap();
        assert_eq!(stats.len(), 2);
        let male = &stats[0];
        assert_eq!(male.gender, "Male");
        // the null BMI row is excluded: two readings remain
        assert_eq!(male.median, 29.0);
        assert!(male.outliers.is_empty());
        assert!(male.lower_whisker <= male.q1 && male.q3 <= male.upper_whisker);
    }

    #[test]
    fn single_reading_gives_degenerate_box() {
        let df = df!(
            GENDER => ["Female"],
            BMI => [25.0],
        )
        .unwrap();
        let stats = bmi_by_gender(&df).unwrap();
        assert_eq!(stats.len(), 1);
        let b = &stats[0];
        assert_eq!((b.q1, b.median, b.q3), (25.0, 25.0, 25.0));
        assert_eq!((b.lower_whisker, b.upper_whisker), (25.0, 25.0));
    }

    #[test]
    fn empty_table_degrades_gracefully() {
        let df = empty();
        assert!(gender_distribution(&df).unwrap().is_empty());
        assert!(stroke_by_age(&df).unwrap().is_empty());
        assert!(glucose_by_age(&df).unwrap().is_empty());
        assert!(bmi_by_gender(&df).unwrap().is_empty());
        let split = condition_split(&df).unwrap();
        assert_eq!(split.total(), 0);
    }
}
