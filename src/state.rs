use std::collections::BTreeSet;

use crate::color::ColorMap;
use crate::data::estimator::{EstimateInput, LinearRateModel, PriceModel};
use crate::data::filter::{filtered_indices, init_filter_state, FilterState};
use crate::data::model::{FieldValue, FilterDimension, HousingDataset};

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

/// Which view the central panel shows. Pages share one filter pipeline;
/// they only select which charts render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    KpisAndMainCharts,
    OverviewCharts,
    PriceCalculator,
}

impl Page {
    pub const ALL: [Page; 3] = [
        Page::KpisAndMainCharts,
        Page::OverviewCharts,
        Page::PriceCalculator,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Page::KpisAndMainCharts => "KPIs and Main Charts",
            Page::OverviewCharts => "Other Charts and Overview",
            Page::PriceCalculator => "Price Calculator",
        }
    }
}

/// Sort order for the year-over-year table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YoySort {
    PercentChange,
    ChangeMagnitude,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering. The dataset is owned here;
/// there is no process-wide copy.
pub struct AppState {
    /// Loaded dataset (None until the user loads a file).
    pub dataset: Option<HousingDataset>,

    /// Per-dimension filter selections.
    pub filters: FilterState,

    /// Indices of records passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Active page.
    pub page: Page,

    /// Active sort order for the year-over-year table.
    pub yoy_sort: YoySort,

    /// Colours for the property-type dimension, used by scatter hues and
    /// the sidebar swatches.
    pub type_colors: Option<ColorMap>,

    /// Pluggable price model behind the calculator page.
    pub estimator: Box<dyn PriceModel>,

    /// Current calculator inputs.
    pub estimate_input: EstimateInput,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Whether a file loading operation is in progress.
    pub loading: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            dataset: None,
            filters: FilterState::default(),
            visible_indices: Vec::new(),
            page: Page::KpisAndMainCharts,
            yoy_sort: YoySort::PercentChange,
            type_colors: None,
            estimator: Box::new(LinearRateModel::default()),
            estimate_input: EstimateInput::default(),
            status_message: None,
            loading: false,
        }
    }
}

impl AppState {
    /// Ingest a newly loaded dataset, initialise filters and colours.
    pub fn set_dataset(&mut self, dataset: HousingDataset) {
        self.filters = init_filter_state(&dataset);
        self.visible_indices = (0..dataset.len()).collect();
        self.type_colors = dataset
            .unique_values
            .get(&FilterDimension::PropertyType)
            .map(ColorMap::new);

        self.dataset = Some(dataset);
        self.status_message = None;
        self.loading = false;
    }

    /// Recompute `visible_indices` after a filter change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.visible_indices = filtered_indices(ds, &self.filters);
        }
    }

    /// Toggle a single value in a dimension's filter.
    pub fn toggle_filter_value(&mut self, dim: FilterDimension, value: &FieldValue) {
        let selected = self.filters.entry(dim).or_default();
        if selected.contains(value) {
            selected.remove(value);
        } else {
            selected.insert(value.clone());
        }
        self.refilter();
    }

    /// Select all values in a dimension.
    pub fn select_all(&mut self, dim: FilterDimension) {
        if let Some(ds) = &self.dataset {
            if let Some(all_vals) = ds.unique_values.get(&dim) {
                self.filters.insert(dim, all_vals.clone());
                self.refilter();
            }
        }
    }

    /// Deselect all values in a dimension.
    pub fn select_none(&mut self, dim: FilterDimension) {
        self.filters.insert(dim, BTreeSet::new());
        self.refilter();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Record;
    use chrono::NaiveDate;

    fn small_dataset() -> HousingDataset {
        HousingDataset::from_records(vec![
            Record {
                suburb: "Abbotsford".into(),
                region: "Northern".into(),
                property_type: "h".into(),
                rooms: Some(3),
                bathroom: 1.0,
                date: NaiveDate::from_ymd_opt(2016, 4, 2),
                ..Record::default()
            }
            .with_derived(),
            Record {
                suburb: "Armadale".into(),
                region: "Southern".into(),
                property_type: "u".into(),
                rooms: Some(2),
                bathroom: 2.0,
                date: NaiveDate::from_ymd_opt(2017, 4, 2),
                ..Record::default()
            }
            .with_derived(),
        ])
    }

    #[test]
    fn set_dataset_selects_everything() {
        let mut state = AppState::default();
        state.set_dataset(small_dataset());
        assert_eq!(state.visible_indices, vec![0, 1]);
        assert!(state.type_colors.is_some());
    }

    #[test]
    fn toggling_a_value_narrows_then_restores_the_view() {
        let mut state = AppState::default();
        state.set_dataset(small_dataset());

        let southern = FieldValue::Text("Southern".into());
        state.toggle_filter_value(FilterDimension::Region, &southern);
        assert_eq!(state.visible_indices, vec![0]);

        state.toggle_filter_value(FilterDimension::Region, &southern);
        assert_eq!(state.visible_indices, vec![0, 1]);
    }

    #[test]
    fn select_none_empties_the_view() {
        let mut state = AppState::default();
        state.set_dataset(small_dataset());
        state.select_none(FilterDimension::Rooms);
        assert!(state.visible_indices.is_empty());

        state.select_all(FilterDimension::Rooms);
        assert_eq!(state.visible_indices, vec![0, 1]);
    }
}
