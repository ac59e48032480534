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

//! Donut chart drawn with the egui painter; egui_plot has no pie
//! primitive.

use eframe::egui::{self, Color32, Pos2, Sense, Vec2};

const HOLE_RATIO: f32 = 0.4;
const SEGMENTS_PER_RADIAN: f32 = 16.0;

#[derive(Debug, Clone)]
pub struct PieSlice {
    pub label: String,
    /// Display value; may be negative (shown in the legend but drawn
    /// as an empty slice).
    pub value: f64,
    pub color: Color32,
}

fn sector_mesh(
    center: Pos2,
    inner: f32,
    outer: f32,
    start_angle: f32,
    end_angle: f32,
    color: Color32,
) -> egui::Mesh {
    let mut mesh = egui::Mesh::default();
    let span = end_angle - start_angle;
    let segments = ((span * SEGMENTS_PER_RADIAN).ceil() as usize).max(2);
    for i in 0..=segments {
        let angle = start_angle + span * (i as f32 / segments as f32);
        let dir = Vec2::new(angle.cos(), angle.sin());
        mesh.colored_vertex(center + dir * inner, color);
        mesh.colored_vertex(center + dir * outer, color);
    }
    for i in 0..segments {
        let base = (i * 2) as u32;
        mesh.add_triangle(base, base + 1, base + 2);
        mesh.add_triangle(base + 1, base + 3, base + 2);
    }
    mesh
}

/// Draws the donut with a legend column on the right. Zero or one
/// slice renders a degenerate but valid chart; an all-zero total
/// renders the placeholder text instead.
pub fn donut(ui: &mut egui::Ui, slices: &[PieSlice], size: f32) {
    let total: f64 = slices.iter().map(|s| s.value.max(0.0)).sum();

    ui.horizontal(|ui| {
        let (response, painter) = ui.allocate_painter(Vec2::splat(size), Sense::hover());
        let rect = response.rect;
        let center = rect.center();
        let outer = rect.width().min(rect.height()) * 0.5 - 4.0;
        let inner = outer * HOLE_RATIO;

        if total <= 0.0 {
            painter.text(
                center,
                egui::Align2::CENTER_CENTER,
                "no data",
                egui::FontId::proportional(14.0),
                ui.visuals().weak_text_color(),
            );
        } else {
            let mut angle = -std::f32::consts::FRAC_PI_2;
            for slice in slices {
                let fraction = (slice.value.max(0.0) / total) as f32;
                if fraction <= 0.0 {
                    continue;
                }
                let end = angle + fraction * std::f32::consts::TAU;
                painter.add(sector_mesh(center, inner, outer, angle, end, slice.color));
                angle = end;
            }
        }

        ui.add_space(12.0);
        ui.vertical(|ui| {
            for slice in slices {
                ui.horizontal(|ui| {
                    let (swatch, painter) =
                        ui.allocate_painter(Vec2::splat(12.0), Sense::hover());
                    painter.rect_filled(swatch.rect, 2.0, slice.color);
                    let share = if total > 0.0 {
                        100.0 * slice.value.max(0.0) / total
                    } else {
                        0.0
                    };
                    ui.label(format!("{}: {} ({share:.1}%)", slice.label, slice.value));
                });
            }
        });
    });
}
