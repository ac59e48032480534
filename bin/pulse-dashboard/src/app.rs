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

use crate::pie::{self, PieSlice};
use eframe::egui::{self, Color32};
use egui_plot::{Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Line, Plot, PlotPoints, Points};
use pulse::charts::{
    self, AgeOutcomeCount, AgePoint, ConditionSplit, GenderBoxStats, SliceCount,
};
use pulse::{
    Dashboard, DatasetCache, ErrorReporter, FilterParams, InsightReport, KpiSummary, Result,
    RECOMMENDATIONS,
};
use std::path::PathBuf;
use tracing::warn;

const PALETTE: [Color32; 6] = [
    Color32::from_rgb(0x63, 0x6e, 0xfa),
    Color32::from_rgb(0xef, 0x55, 0x3b),
    Color32::from_rgb(0x00, 0xcc, 0x96),
    Color32::from_rgb(0xab, 0x63, 0xfa),
    Color32::from_rgb(0xff, 0xa1, 0x5a),
    Color32::from_rgb(0x19, 0xd3, 0xf3),
];

fn palette(i: usize) -> Color32 {
    PALETTE[i % PALETTE.len()]
}

fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn fmt2(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "n/a".to_string(),
    }
}

/// Aggregations over the filtered view, cached against the filter
/// params that produced them so a frame without filter changes does
/// no dataframe work.
struct ChartData {
    gender: Vec<SliceCount>,
    stroke_by_age: Vec<AgeOutcomeCount>,
    conditions: ConditionSplit,
    glucose: Vec<AgePoint>,
    bmi_boxes: Vec<GenderBoxStats>,
    filtered_rows: usize,
}

fn recompute_charts(board: &Dashboard, params: &FilterParams) -> Result<ChartData> {
    let filtered = board.filtered(params)?;
    Ok(ChartData {
        gender: charts::gender_distribution(&filtered)?,
        stroke_by_age: charts::stroke_by_age(&filtered)?,
        conditions: charts::condition_split(&filtered)?,
        glucose: charts::glucose_by_age(&filtered)?,
        bmi_boxes: charts::bmi_by_gender(&filtered)?,
        filtered_rows: filtered.height(),
    })
}

struct ReadyState {
    board: Dashboard,
    kpis: KpiSummary,
    insight: InsightReport,

    age_bounds: (i64, i64),
    gender_options: Vec<String>,
    smoking_options: Vec<String>,

    age_range: (i64, i64),
    gender_selected: Vec<bool>,
    smoking_selected: Vec<bool>,

    chart_cache: Option<(FilterParams, ChartData)>,
    render_error: Option<String>,
}

enum AppState {
    Failed(String),
    Ready(Box<ReadyState>),
}

pub struct DashboardApp {
    state: AppState,
    reporter: ErrorReporter,
}

impl DashboardApp {
    pub fn new(data_path: PathBuf) -> Self {
        let reporter = ErrorReporter::new();
        let state = match Self::startup(&data_path) {
            Ok(ready) => AppState::Ready(Box::new(ready)),
            Err(e) => {
                warn!(path = %data_path.display(), error = %e, "startup load failed");
                AppState::Failed(reporter.report(&e))
            }
        };
        Self { state, reporter }
    }

    fn startup(data_path: &PathBuf) -> Result<ReadyState> {
        let mut cache = DatasetCache::new();
        let board = Dashboard::load(&mut cache, data_path)?;
        let kpis = board.kpis()?;
        let insight = board.insight()?;
        let defaults = board.default_filters()?;
        let gender_options = defaults.genders.clone();
        let smoking_options = defaults.smoking.clone();
        Ok(ReadyState {
            board,
            kpis,
            insight,
            age_bounds: defaults.age_range,
            gender_selected: vec![true; gender_options.len()],
            smoking_selected: vec![true; smoking_options.len()],
            gender_options,
            smoking_options,
            age_range: defaults.age_range,
            chart_cache: None,
            render_error: None,
        })
    }
}

impl ReadyState {
    fn current_params(&self) -> FilterParams {
        let selected = |options: &[String], flags: &[bool]| {
            options
                .iter()
                .zip(flags)
                .filter(|(_, on)| **on)
                .map(|(label, _)| label.clone())
                .collect::<Vec<_>>()
        };
        FilterParams {
            age_range: self.age_range,
            genders: selected(&self.gender_options, &self.gender_selected),
            smoking: selected(&self.smoking_options, &self.smoking_selected),
        }
    }

    fn ensure_charts(&mut self, reporter: &ErrorReporter) {
        let params = self.current_params();
        let stale = self
            .chart_cache
            .as_ref()
            .map(|(cached, _)| *cached != params)
            .unwrap_or(true);
        if !stale {
            return;
        }
        match recompute_charts(&self.board, &params) {
            Ok(data) => {
                self.chart_cache = Some((params, data));
                self.render_error = None;
            }
            Err(e) => {
                self.render_error = Some(reporter.report(&e));
            }
        }
    }

    fn render_sidebar(&mut self, ui: &mut egui::Ui) {
        ui.heading("Filters");
        ui.separator();

        ui.label("Age range:");
        let (lo_bound, hi_bound) = self.age_bounds;
        ui.add(egui::Slider::new(&mut self.age_range.0, lo_bound..=self.age_range.1).text("min"));
        ui.add(egui::Slider::new(&mut self.age_range.1, self.age_range.0..=hi_bound).text("max"));

        ui.separator();
        ui.label("Gender:");
        for (label, on) in self.gender_options.iter().zip(&mut self.gender_selected) {
            ui.checkbox(on, label);
        }

        ui.separator();
        ui.label("Smoking status:");
        for (label, on) in self.smoking_options.iter().zip(&mut self.smoking_selected) {
            ui.checkbox(on, label);
        }

        ui.separator();
        if ui.button("Reset filters").clicked() {
            self.age_range = self.age_bounds;
            self.gender_selected = vec![true; self.gender_options.len()];
            self.smoking_selected = vec![true; self.smoking_options.len()];
        }
    }

    fn render_kpis(&self, ui: &mut egui::Ui) {
        let card = |ui: &mut egui::Ui, title: &str, value: String| {
            ui.vertical(|ui| {
                ui.label(title);
                ui.strong(egui::RichText::new(value).size(24.0));
            });
        };
        ui.columns(4, |cols| {
            card(
                &mut cols[0],
                "Total Patients",
                thousands(self.kpis.total_patients as u64),
            );
            card(
                &mut cols[1],
                "Average Glucose Level",
                fmt2(self.kpis.avg_glucose),
            );
            card(&mut cols[2], "Average BMI", fmt2(self.kpis.avg_bmi));
            card(
                &mut cols[3],
                "Stroke Cases",
                thousands(self.kpis.stroke_cases.max(0) as u64),
            );
        });
    }

    fn render_charts(&self, ui: &mut egui::Ui) {
        let Some((_, data)) = &self.chart_cache else {
            return;
        };

        ui.heading("Gender Distribution");
        if data.gender.is_empty() {
            ui.label("No rows match the current filters.");
        } else {
            let slices: Vec<PieSlice> = data
                .gender
                .iter()
                .enumerate()
                .map(|(i, s)| PieSlice {
                    label: s.label.clone(),
                    value: s.count as f64,
                    color: palette(i),
                })
                .collect();
            pie::donut(ui, &slices, 180.0);
        }
        ui.separator();

        ui.heading("Stroke Cases by Age");
        if data.stroke_by_age.is_empty() {
            ui.label("No rows match the current filters.");
        } else {
            let no_stroke: Vec<Bar> = data
                .stroke_by_age
                .iter()
                .map(|r| Bar::new(r.age as f64 - 0.2, r.no_stroke as f64).width(0.4))
                .collect();
            let stroke: Vec<Bar> = data
                .stroke_by_age
                .iter()
                .map(|r| Bar::new(r.age as f64 + 0.2, r.stroke as f64).width(0.4))
                .collect();
            Plot::new("stroke_by_age")
                .legend(Legend::default())
                .height(260.0)
                .show(ui, |plot_ui| {
                    plot_ui.bar_chart(BarChart::new("No Stroke", no_stroke).color(palette(0)));
                    plot_ui.bar_chart(BarChart::new("Stroke", stroke).color(palette(1)));
                });
        }
        ui.separator();

        ui.heading("Hypertension vs Heart Disease");
        {
            let split = &data.conditions;
            if data.filtered_rows == 0 {
                ui.label("No rows match the current filters.");
            } else {
                let slices = vec![
                    PieSlice {
                        label: "Hypertension".to_string(),
                        value: split.hypertension as f64,
                        color: palette(0),
                    },
                    PieSlice {
                        label: "Heart Disease".to_string(),
                        value: split.heart_disease as f64,
                        color: palette(1),
                    },
                    PieSlice {
                        label: "Neither".to_string(),
                        // can be negative; the legend shows the signed
                        // value while the drawn slice floors at zero
                        value: split.neither as f64,
                        color: palette(2),
                    },
                ];
                pie::donut(ui, &slices, 180.0);
            }
        }
        ui.separator();

        ui.heading("Average Glucose Level by Age");
        if data.glucose.is_empty() {
            ui.label("No rows match the current filters.");
        } else {
            let points: Vec<[f64; 2]> = data
                .glucose
                .iter()
                .map(|p| [p.age as f64, p.mean_glucose])
                .collect();
            Plot::new("glucose_by_age")
                .height(260.0)
                .show(ui, |plot_ui| {
                    plot_ui.line(
                        Line::new("Avg Glucose Level", PlotPoints::from(points))
                            .color(palette(0)),
                    );
                });
        }
        ui.separator();

        ui.heading("BMI Distribution by Gender");
        if data.bmi_boxes.is_empty() {
            ui.label("No rows match the current filters.");
        } else {
            Plot::new("bmi_by_gender")
                .legend(Legend::default())
                .height(260.0)
                .show(ui, |plot_ui| {
                    for (i, stats) in data.bmi_boxes.iter().enumerate() {
                        let x = i as f64;
                        let elem = BoxElem::new(
                            x,
                            BoxSpread::new(
                                stats.lower_whisker,
                                stats.q1,
                                stats.median,
                                stats.q3,
                                stats.upper_whisker,
                            ),
                        )
                        .fill(palette(i).gamma_multiply(0.4))
                        .stroke(egui::Stroke::new(1.5, palette(i)));
                        plot_ui.box_plot(
                            BoxPlot::new(stats.gender.clone(), vec![elem]).color(palette(i)),
                        );
                        if !stats.outliers.is_empty() {
                            let outliers: Vec<[f64; 2]> =
                                stats.outliers.iter().map(|v| [x, *v]).collect();
                            plot_ui.points(
                                Points::new(
                                    format!("{} outliers", stats.gender),
                                    PlotPoints::from(outliers),
                                )
                                .color(palette(i))
                                .radius(2.0),
                            );
                        }
                    }
                });
        }
    }

    fn render_insights(&self, ui: &mut egui::Ui) {
        ui.heading("Insights");
        for line in self.insight.bullet_lines() {
            ui.label(format!("• {line}"));
        }
        ui.add_space(8.0);
        ui.strong("Recommendations:");
        for line in RECOMMENDATIONS {
            ui.label(format!("• {line}"));
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        match &mut self.state {
            AppState::Failed(message) => {
                let message = message.clone();
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.colored_label(Color32::RED, "Failed to load the survey dataset:");
                    ui.separator();
                    ui.monospace(message);
                });
            }
            AppState::Ready(ready) => {
                ready.ensure_charts(&self.reporter);

                egui::SidePanel::left("filter_panel").show(ctx, |ui| {
                    ready.render_sidebar(ui);
                });

                egui::CentralPanel::default().show(ctx, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        ui.heading("Stroke Data Dashboard");
                        ui.separator();
                        ready.render_kpis(ui);
                        ui.separator();

                        if let Some(error) = &ready.render_error {
                            ui.colored_label(Color32::RED, "Error:");
                            ui.monospace(error);
                            ui.separator();
                        }

                        ready.render_charts(ui);
                        ui.separator();
                        ready.render_insights(ui);
                    });
                });
            }
        }
    }
}
