use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use eframe::egui::{self, Color32, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, Points};

use crate::color::{generate_palette, ColorMap};
use crate::data::model::{FieldValue, HousingDataset};
use crate::data::stats::{
    mean_price_by_month, mean_price_by_region, price_summary, type_counts, year_over_year,
    YearOverYearChange, YearOverYearTable,
};
use crate::state::{AppState, Page, YoySort};

// ---------------------------------------------------------------------------
// Central panel – dispatch on the active page
// ---------------------------------------------------------------------------

/// Render the central panel for the active page. All charts are derived
/// from the filtered view; the pages differ only in which charts they show.
pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    if state.page == Page::PriceCalculator {
        calculator_page(ui, state);
        return;
    }

    let Some(dataset) = &state.dataset else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a dataset to explore sales  (File → Open…)");
        });
        return;
    };

    let mut yoy_sort = state.yoy_sort;
    match state.page {
        Page::KpisAndMainCharts => kpi_page(ui, dataset, &state.visible_indices),
        Page::OverviewCharts => overview_page(
            ui,
            dataset,
            &state.visible_indices,
            state.type_colors.as_ref(),
            &mut yoy_sort,
        ),
        Page::PriceCalculator => {}
    }
    state.yoy_sort = yoy_sort;
}

// ---------------------------------------------------------------------------
// Page: KPIs and main charts
// ---------------------------------------------------------------------------

fn kpi_page(ui: &mut Ui, dataset: &HousingDataset, indices: &[usize]) {
    ui.heading("Key Performance Indicators");
    ui.add_space(4.0);

    let summary = price_summary(dataset, indices);
    ui.columns(4, |cols: &mut [Ui]| {
        kpi_tile(&mut cols[0], "Average Price", summary.mean);
        kpi_tile(&mut cols[1], "Median Price", summary.median);
        kpi_tile(&mut cols[2], "Maximum Price", summary.max);
        kpi_tile(&mut cols[3], "Minimum Price", summary.min);
    });

    ui.add_space(8.0);
    ui.columns(2, |cols: &mut [Ui]| {
        let distance_points: Vec<[f64; 2]> = indices
            .iter()
            .filter_map(|&i| {
                let rec = &dataset.records[i];
                Some([rec.distance?, rec.price?])
            })
            .collect();
        cols[0].strong("Price Variation by Distance");
        scatter_chart(
            &mut cols[0],
            "distance_price",
            "Distance (km)",
            distance_points,
        );

        let area_points: Vec<[f64; 2]> = indices
            .iter()
            .filter_map(|&i| {
                let rec = &dataset.records[i];
                Some([rec.building_area?, rec.price?])
            })
            .collect();
        cols[1].strong("Price by Building Area");
        scatter_chart(&mut cols[1], "area_price", "Building Area", area_points);
    });
}

fn kpi_tile(ui: &mut Ui, label: &str, value: f64) {
    ui.group(|ui: &mut Ui| {
        ui.vertical_centered(|ui: &mut Ui| {
            ui.label(label);
            ui.heading(format_price(value));
        });
    });
}

fn scatter_chart(ui: &mut Ui, id: &str, x_label: &str, points: Vec<[f64; 2]>) {
    Plot::new(id.to_owned())
        .height(300.0)
        .x_axis_label(x_label)
        .y_axis_label("Price")
        .show(ui, |plot_ui| {
            plot_ui.points(Points::new(points).radius(2.0).color(Color32::LIGHT_BLUE));
        });
}

// ---------------------------------------------------------------------------
// Page: other charts and overview
// ---------------------------------------------------------------------------

fn overview_page(
    ui: &mut Ui,
    dataset: &HousingDataset,
    indices: &[usize],
    type_colors: Option<&ColorMap>,
    yoy_sort: &mut YoySort,
) {
    ui.heading("Other Charts and Overview");
    ui.add_space(4.0);

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.columns(2, |cols: &mut [Ui]| {
                price_trend_chart(&mut cols[0], dataset, indices);
                landsize_scatter(&mut cols[1], dataset, indices, type_colors);
            });

            ui.add_space(8.0);
            ui.columns(2, |cols: &mut [Ui]| {
                region_bar_chart(&mut cols[0], dataset, indices);
                type_distribution_chart(&mut cols[1], dataset, indices, type_colors);
            });

            ui.add_space(8.0);
            ui.heading("Year-over-Year Change by Suburb");
            let table = year_over_year(dataset, indices);
            yoy_table(ui, &table, yoy_sort);
        });
}

/// Mean price per month, as a line over the filtered view.
fn price_trend_chart(ui: &mut Ui, dataset: &HousingDataset, indices: &[usize]) {
    ui.strong("Price Trend Over Time");
    let months = mean_price_by_month(dataset, indices);
    if months.is_empty() {
        ui.label("No dated, priced sales in the current view.");
        return;
    }

    let labels: Vec<String> = months.iter().map(|(m, _)| m.clone()).collect();
    let points: Vec<[f64; 2]> = months
        .iter()
        .enumerate()
        .map(|(i, (_, mean))| [i as f64, *mean])
        .collect();

    Plot::new("price_trend")
        .height(300.0)
        .y_axis_label("Mean Price")
        .x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            category_tick(&labels, mark)
        })
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(points).color(Color32::LIGHT_BLUE).width(1.5));
        });
}

/// Land size vs price, coloured by property type.
fn landsize_scatter(
    ui: &mut Ui,
    dataset: &HousingDataset,
    indices: &[usize],
    type_colors: Option<&ColorMap>,
) {
    ui.strong("Price Variation According to the Land Size");

    let mut by_type: BTreeMap<&str, Vec<[f64; 2]>> = BTreeMap::new();
    for &i in indices {
        let rec = &dataset.records[i];
        if let (Some(land), Some(price)) = (rec.land_size, rec.price) {
            by_type
                .entry(&rec.property_type)
                .or_default()
                .push([land, price]);
        }
    }

    Plot::new("landsize_price")
        .height(300.0)
        .legend(Legend::default())
        .x_axis_label("Land Size")
        .y_axis_label("Price")
        .show(ui, |plot_ui| {
            for (ptype, pts) in by_type {
                let color = type_colors
                    .map(|cm| cm.color_for(&FieldValue::Text(ptype.to_string())))
                    .unwrap_or(Color32::LIGHT_BLUE);
                plot_ui.points(Points::new(pts).name(ptype).radius(2.0).color(color));
            }
        });
}

/// Average price per region, ascending bars.
fn region_bar_chart(ui: &mut Ui, dataset: &HousingDataset, indices: &[usize]) {
    ui.strong("Average Price by Region");
    let means = mean_price_by_region(dataset, indices);
    if means.is_empty() {
        ui.label("No priced sales in the current view.");
        return;
    }

    let labels: Vec<String> = means.iter().map(|(region, _)| region.clone()).collect();
    let palette = generate_palette(means.len());
    let bars: Vec<Bar> = means
        .iter()
        .enumerate()
        .map(|(i, (region, mean))| Bar::new(i as f64, *mean).name(region).fill(palette[i]))
        .collect();

    Plot::new("region_means")
        .height(300.0)
        .y_axis_label("Average Price")
        .x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            category_tick(&labels, mark)
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}

/// Sale counts per property type.
fn type_distribution_chart(
    ui: &mut Ui,
    dataset: &HousingDataset,
    indices: &[usize],
    type_colors: Option<&ColorMap>,
) {
    ui.strong("Property Type Distribution");
    let counts = type_counts(dataset, indices);
    if counts.is_empty() {
        ui.label("No sales in the current view.");
        return;
    }

    let labels: Vec<String> = counts.iter().map(|(ptype, _)| ptype.clone()).collect();
    let bars: Vec<Bar> = counts
        .iter()
        .enumerate()
        .map(|(i, (ptype, n))| {
            let color = type_colors
                .map(|cm| cm.color_for(&FieldValue::Text(ptype.clone())))
                .unwrap_or(Color32::LIGHT_BLUE);
            Bar::new(i as f64, *n as f64).name(ptype).fill(color)
        })
        .collect();

    Plot::new("type_distribution")
        .height(300.0)
        .y_axis_label("Sales")
        .x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            category_tick(&labels, mark)
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}

/// Year-over-year change table with switchable sort order.
fn yoy_table(ui: &mut Ui, table: &YearOverYearTable, sort: &mut YoySort) {
    let Some((first_year, second_year)) = table.years else {
        ui.label("Not enough sale years in the current view for a comparison.");
        return;
    };

    ui.horizontal(|ui: &mut Ui| {
        ui.label("Sort by:");
        ui.selectable_value(sort, YoySort::PercentChange, "Change % (desc)");
        ui.selectable_value(sort, YoySort::ChangeMagnitude, "Top 5 movers");
    });

    let rows: Vec<&YearOverYearChange> = match sort {
        YoySort::PercentChange => {
            let mut rows = table.sorted_by_percent_change();
            rows.truncate(10);
            rows
        }
        YoySort::ChangeMagnitude => table.top_by_change_magnitude(5),
    };

    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(Column::auto().at_least(140.0))
        .columns(Column::remainder(), 4)
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("Suburb");
            });
            header.col(|ui| {
                ui.strong(format!("{first_year} mean"));
            });
            header.col(|ui| {
                ui.strong(format!("{second_year} mean"));
            });
            header.col(|ui| {
                ui.strong("Change");
            });
            header.col(|ui| {
                ui.strong("Change %");
            });
        })
        .body(|mut body| {
            for row in rows {
                body.row(18.0, |mut table_row| {
                    table_row.col(|ui| {
                        ui.label(&row.suburb);
                    });
                    table_row.col(|ui| {
                        ui.label(format_opt_price(row.first_price));
                    });
                    table_row.col(|ui| {
                        ui.label(format_opt_price(row.second_price));
                    });
                    table_row.col(|ui| {
                        ui.label(format_opt_price(row.change));
                    });
                    table_row.col(|ui| {
                        ui.label(
                            row.percent_change
                                .map(|p| format!("{p:+.1}%"))
                                .unwrap_or_else(|| "n/a".to_string()),
                        );
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Page: price calculator
// ---------------------------------------------------------------------------

fn calculator_page(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Price Calculator");
    ui.add_space(4.0);
    ui.label("Enter the details to estimate the price");
    ui.add_space(8.0);

    egui::Grid::new("calculator_inputs")
        .num_columns(2)
        .spacing([12.0, 8.0])
        .show(ui, |ui: &mut Ui| {
            ui.label("Distance (in km)");
            ui.add(
                egui::DragValue::new(&mut state.estimate_input.distance_km)
                    .speed(0.1)
                    .range(0.0..=f64::MAX),
            );
            ui.end_row();

            ui.label("Land Size (in sqm)");
            ui.add(
                egui::DragValue::new(&mut state.estimate_input.land_size)
                    .speed(1.0)
                    .range(0.0..=f64::MAX),
            );
            ui.end_row();

            ui.label("Building Area (in sqm)");
            ui.add(
                egui::DragValue::new(&mut state.estimate_input.building_area)
                    .speed(1.0)
                    .range(0.0..=f64::MAX),
            );
            ui.end_row();
        });

    ui.add_space(12.0);
    let estimate = state.estimator.estimate(&state.estimate_input);
    ui.heading(format!("Estimated Price: {}", format_price(estimate)));
    ui.label(format!("Model: {}", state.estimator.name()));
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Label for an integer category tick; empty for fractional grid marks.
fn category_tick(labels: &[String], mark: GridMark) -> String {
    let rounded = mark.value.round();
    if (mark.value - rounded).abs() > 0.05 || rounded < 0.0 {
        return String::new();
    }
    labels.get(rounded as usize).cloned().unwrap_or_default()
}

/// `$1,234,568` style; NaN renders as "no data".
fn format_price(value: f64) -> String {
    if value.is_nan() {
        return "no data".to_string();
    }
    let rounded = value.round() as i64;
    let sign = if rounded < 0 { "-" } else { "" };
    format!("{sign}${}", group_thousands(rounded.unsigned_abs()))
}

fn format_opt_price(value: Option<f64>) -> String {
    value.map(format_price).unwrap_or_else(|| "n/a".to_string())
}

fn group_thousands(n: u64) -> String {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prices_format_with_thousands_separators() {
        assert_eq!(format_price(1_035_000.0), "$1,035,000");
        assert_eq!(format_price(999.4), "$999");
        assert_eq!(format_price(-20_500.0), "-$20,500");
        assert_eq!(format_price(f64::NAN), "no data");
    }

    #[test]
    fn missing_values_render_as_na() {
        assert_eq!(format_opt_price(None), "n/a");
        assert_eq!(format_opt_price(Some(100.0)), "$100");
    }

    #[test]
    fn category_ticks_only_label_whole_indices() {
        let labels = vec!["2016-04".to_string(), "2016-05".to_string()];
        let at = |v: f64| category_tick(&labels, GridMark { value: v, step_size: 1.0 });
        assert_eq!(at(0.0), "2016-04");
        assert_eq!(at(1.0), "2016-05");
        assert_eq!(at(0.5), "");
        assert_eq!(at(5.0), "");
    }
}
