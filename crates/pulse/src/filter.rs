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

use crate::dataset::{column, AGE, GENDER, SMOKING_STATUS};
use crate::error::{DataResult, FilterError, Result};
use indexmap::IndexSet;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Observed integer age bounds of the dataset, used to seed the age
/// slider. Fractional ages are floored.
pub fn age_bounds(df: &DataFrame) -> DataResult<(i64, i64)> {
    let ages = column(df, AGE)?.cast(&DataType::Float64)?;
    let ages = ages.f64()?;
    let min = ages.min().map(|v| v.floor() as i64).unwrap_or(0);
    let max = ages.max().map(|v| v.floor() as i64).unwrap_or(0);
    Ok((min, max))
}

/// Distinct non-null labels of a categorical column, in first-seen
/// row order.
pub fn distinct_labels(df: &DataFrame, name: &str) -> DataResult<Vec<String>> {
    let labels = column(df, name)?.cast(&DataType::String)?;
    let labels = labels.str()?;
    let mut seen: IndexSet<String> = IndexSet::new();
    for label in labels.into_iter().flatten() {
        seen.insert(label.to_string());
    }
    Ok(seen.into_iter().collect())
}

/// User-selected filter criteria. Applying them is a pure predicate
/// over the full table; the source is never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    pub age_range: (i64, i64),
    pub genders: Vec<String>,
    pub smoking: Vec<String>,
}

impl FilterParams {
    /// The default selection: full observed age range and every
    /// distinct gender and smoking label.
    pub fn all_of(df: &DataFrame) -> DataResult<Self> {
        Ok(Self {
            age_range: age_bounds(df)?,
            genders: distinct_labels(df, GENDER)?,
            smoking: distinct_labels(df, SMOKING_STATUS)?,
        })
    }

    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        let (min, max) = self.age_range;
        if min > max {
            return Err(FilterError::InvalidAgeRange { min, max }.into());
        }

        let ages = column(df, AGE)?.cast(&DataType::Float64)?;
        let genders = column(df, GENDER)?.cast(&DataType::String)?;
        let smoking = column(df, SMOKING_STATUS)?.cast(&DataType::String)?;

        let ages = ages.f64()?;
        let genders = genders.str()?;
        let smoking = smoking.str()?;

        // Age bounds are inclusive on both ends; raw (possibly
        // fractional) ages are compared against the integer bounds.
        // Null labels never match a selection.
        let mask: Vec<bool> = ages
            .into_iter()
            .zip(genders.into_iter())
            .zip(smoking.into_iter())
            .map(|((age, gender), smoke)| {
                let age_ok = age.is_some_and(|a| a >= min as f64 && a <= max as f64);
                let gender_ok =
                    gender.is_some_and(|g| self.genders.iter().any(|sel| sel == g));
                let smoke_ok = smoke.is_some_and(|s| self.smoking.iter().any(|sel| sel == s));
                age_ok && gender_ok && smoke_ok
            })
            .collect();

        let mask = BooleanChunked::from_slice("mask".into(), &mask);
        let filtered = df.filter(&mask)?;
        debug!(
            rows_in = df.height(),
            rows_out = filtered.height(),
            "filter applied"
        );
        Ok(filtered)
    }
}
