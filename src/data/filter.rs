use std::collections::{BTreeMap, BTreeSet};

use super::model::{FieldValue, FilterDimension, HousingDataset};

// ---------------------------------------------------------------------------
// Filter predicate: which values are selected per dimension
// ---------------------------------------------------------------------------

/// Per-dimension selection state: maps dimension → set of selected values.
pub type FilterState = BTreeMap<FilterDimension, BTreeSet<FieldValue>>;

/// Initialise a [`FilterState`] with every observed value selected, so the
/// default filter is a no-op.
pub fn init_filter_state(dataset: &HousingDataset) -> FilterState {
    dataset
        .unique_values
        .iter()
        .map(|(dim, vals)| (*dim, vals.clone()))
        .collect()
}

/// Return indices of records that pass all active filters, in source order.
///
/// A record passes a dimension filter when:
/// * The dimension is not present in `filters` → passes (no constraint)
/// * The selection set for that dimension is empty → nothing selected → fails
/// * The record's value for that dimension is in the selected set → passes
///
/// Pure function of `(dataset, filters)`; identical inputs always yield the
/// same indices.
pub fn filtered_indices(dataset: &HousingDataset, filters: &FilterState) -> Vec<usize> {
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            for (dim, selected) in filters {
                if selected.is_empty() {
                    // Nothing selected for this dimension → hide everything
                    return false;
                }
                // Check all unique values are selected → no effective filter
                if let Some(all_vals) = dataset.unique_values.get(dim) {
                    if selected.len() == all_vals.len() {
                        continue; // everything selected, no filtering needed
                    }
                }
                if !selected.contains(&dim.value_of(rec)) {
                    return false;
                }
            }
            true
        })
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Record;
    use chrono::NaiveDate;

    fn sale(suburb: &str, region: &str, ptype: &str, rooms: i64, bath: f64, date: &str) -> Record {
        Record {
            suburb: suburb.into(),
            region: region.into(),
            property_type: ptype.into(),
            rooms: Some(rooms),
            bathroom: bath,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
            ..Record::default()
        }
        .with_derived()
    }

    fn sample_dataset() -> HousingDataset {
        HousingDataset::from_records(vec![
            sale("Abbotsford", "Northern", "h", 3, 1.0, "2016-04-02"),
            sale("Abbotsford", "Northern", "u", 2, 1.0, "2017-05-06"),
            sale("Armadale", "Southern", "h", 4, 2.0, "2016-09-10"),
            sale("Armadale", "Southern", "t", 3, 2.0, "2017-11-12"),
        ])
    }

    #[test]
    fn full_selection_returns_every_row() {
        let ds = sample_dataset();
        let filters = init_filter_state(&ds);
        assert_eq!(filtered_indices(&ds, &filters), vec![0, 1, 2, 3]);
    }

    #[test]
    fn subset_selection_is_sound_and_complete() {
        let ds = sample_dataset();
        let mut filters = init_filter_state(&ds);
        filters.insert(
            FilterDimension::Region,
            BTreeSet::from([FieldValue::Text("Northern".into())]),
        );
        filters.insert(
            FilterDimension::PropertyType,
            BTreeSet::from([FieldValue::Text("h".into())]),
        );

        let visible = filtered_indices(&ds, &filters);
        assert_eq!(visible, vec![0]);

        // Every surviving row satisfies every selection set.
        for &i in &visible {
            let rec = &ds.records[i];
            for (dim, selected) in &filters {
                assert!(selected.contains(&dim.value_of(rec)));
            }
        }
        // No excluded row would have passed.
        for (i, rec) in ds.records.iter().enumerate() {
            if visible.contains(&i) {
                continue;
            }
            let passes = filters
                .iter()
                .all(|(dim, selected)| selected.contains(&dim.value_of(rec)));
            assert!(!passes, "row {i} was wrongly excluded");
        }
    }

    #[test]
    fn conjunction_across_dimensions() {
        let ds = sample_dataset();
        let mut filters = init_filter_state(&ds);
        // Northern region AND 3 rooms → only the first Abbotsford house.
        filters.insert(
            FilterDimension::Region,
            BTreeSet::from([FieldValue::Text("Northern".into())]),
        );
        filters.insert(FilterDimension::Rooms, BTreeSet::from([FieldValue::Int(3)]));

        assert_eq!(filtered_indices(&ds, &filters), vec![0]);
    }

    #[test]
    fn empty_selection_set_yields_empty_view() {
        let ds = sample_dataset();
        let mut filters = init_filter_state(&ds);
        filters.insert(FilterDimension::Year, BTreeSet::new());

        assert!(filtered_indices(&ds, &filters).is_empty());
    }

    #[test]
    fn rows_with_missing_year_survive_the_default_filter() {
        let mut records = vec![sale("Abbotsford", "Northern", "h", 3, 1.0, "2016-04-02")];
        records.push(
            Record {
                suburb: "Abbotsford".into(),
                region: "Northern".into(),
                property_type: "h".into(),
                rooms: Some(2),
                bathroom: 1.0,
                date: None,
                ..Record::default()
            }
            .with_derived(),
        );
        let ds = HousingDataset::from_records(records);
        let filters = init_filter_state(&ds);

        // Default selection includes the missing-year bucket.
        assert_eq!(filtered_indices(&ds, &filters).len(), 2);

        // Restricting to 2016 drops the missing-year row.
        let mut filters = init_filter_state(&ds);
        filters.insert(FilterDimension::Year, BTreeSet::from([FieldValue::Int(2016)]));
        assert_eq!(filtered_indices(&ds, &filters), vec![0]);
    }
}
