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

use eframe::egui;
use std::path::PathBuf;

mod app;
mod pie;

const DEFAULT_DATA_PATH: &str = "STROKE_HEALTHCARE_CLEANED_DATA.csv";

fn main() -> std::result::Result<(), eframe::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let data_path: PathBuf = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_DATA_PATH.to_string())
        .into();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_title("Stroke Data Dashboard"),
        ..Default::default()
    };
    eframe::run_native(
        "Stroke Data Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(app::DashboardApp::new(data_path)))),
    )
}
