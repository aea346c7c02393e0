use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Datelike, NaiveDate};

// ---------------------------------------------------------------------------
// FieldValue – a single filterable cell value
// ---------------------------------------------------------------------------

/// A dynamically-typed value for the filterable dimensions of a record.
/// Using `BTreeMap` / `BTreeSet` downstream so `FieldValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Float(f64),
    Null,
}

// -- Manual Eq/Ord so we can put FieldValue in BTreeSet --

impl Eq for FieldValue {}

impl PartialOrd for FieldValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FieldValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use FieldValue::*;
        fn discriminant(v: &FieldValue) -> u8 {
            match v {
                Null => 0,
                Int(_) => 1,
                Float(_) => 2,
                Text(_) => 3,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Int(a), Int(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::Int(i) => write!(f, "{i}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Null => write!(f, "<missing>"),
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one sale (one row of the source table)
// ---------------------------------------------------------------------------

/// A single recorded sale. Numeric columns keep whatever the source file
/// contains; only `bathroom` substitutes 0 for missing values and only the
/// sale date is actually parsed.
#[derive(Debug, Clone, Default)]
pub struct Record {
    pub suburb: String,
    pub rooms: Option<i64>,
    pub property_type: String,
    pub price: Option<f64>,
    /// Distance from the city centre in km.
    pub distance: Option<f64>,
    /// Bathroom count; missing in the source becomes 0.
    pub bathroom: f64,
    pub land_size: Option<f64>,
    pub building_area: Option<f64>,
    pub year_built: Option<f64>,
    pub region: String,
    /// Sale date, `None` when the source value failed every known format.
    pub date: Option<NaiveDate>,
    /// `YYYY-MM` bucket derived from `date`.
    pub month_year: Option<String>,
    /// Sale year derived from `date`.
    pub year: Option<i32>,
}

impl Record {
    /// Fill `month_year` and `year` from the sale date. Both stay missing
    /// when the date is missing. The derived fields depend only on `date`,
    /// so re-running is a no-op.
    pub fn with_derived(mut self) -> Self {
        self.month_year = self
            .date
            .map(|d| format!("{:04}-{:02}", d.year(), d.month()));
        self.year = self.date.map(|d| d.year());
        self
    }
}

// ---------------------------------------------------------------------------
// FilterDimension – the five filterable columns
// ---------------------------------------------------------------------------

/// The dimensions the sidebar lets the user filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FilterDimension {
    Region,
    PropertyType,
    Year,
    Rooms,
    Bathroom,
}

impl FilterDimension {
    pub const ALL: [FilterDimension; 5] = [
        FilterDimension::Region,
        FilterDimension::PropertyType,
        FilterDimension::Year,
        FilterDimension::Rooms,
        FilterDimension::Bathroom,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FilterDimension::Region => "Region",
            FilterDimension::PropertyType => "Property Type",
            FilterDimension::Year => "Year",
            FilterDimension::Rooms => "Rooms",
            FilterDimension::Bathroom => "Bathrooms",
        }
    }

    /// Extract this dimension's value from a record.
    pub fn value_of(self, record: &Record) -> FieldValue {
        match self {
            FilterDimension::Region => FieldValue::Text(record.region.clone()),
            FilterDimension::PropertyType => FieldValue::Text(record.property_type.clone()),
            FilterDimension::Year => record
                .year
                .map(|y| FieldValue::Int(i64::from(y)))
                .unwrap_or(FieldValue::Null),
            FilterDimension::Rooms => record
                .rooms
                .map(FieldValue::Int)
                .unwrap_or(FieldValue::Null),
            FilterDimension::Bathroom => FieldValue::Float(record.bathroom),
        }
    }
}

// ---------------------------------------------------------------------------
// HousingDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full normalized dataset with pre-computed per-dimension value sets.
#[derive(Debug, Clone)]
pub struct HousingDataset {
    /// All sales (rows), in source order.
    pub records: Vec<Record>,
    /// For each filter dimension the sorted set of values observed in the
    /// unfiltered dataset. These drive the sidebar option lists and never
    /// shrink as other filters are applied.
    pub unique_values: BTreeMap<FilterDimension, BTreeSet<FieldValue>>,
}

impl HousingDataset {
    /// Build dimension indices from the loaded records.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut unique_values: BTreeMap<FilterDimension, BTreeSet<FieldValue>> = BTreeMap::new();

        for rec in &records {
            for dim in FilterDimension::ALL {
                unique_values
                    .entry(dim)
                    .or_default()
                    .insert(dim.value_of(rec));
            }
        }
        HousingDataset {
            records,
            unique_values,
        }
    }

    /// Number of sales.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_fields_follow_the_date() {
        let rec = Record {
            date: NaiveDate::from_ymd_opt(2017, 3, 4),
            ..Record::default()
        }
        .with_derived();

        assert_eq!(rec.month_year.as_deref(), Some("2017-03"));
        assert_eq!(rec.year, Some(2017));
    }

    #[test]
    fn missing_date_leaves_derived_fields_missing() {
        let rec = Record::default().with_derived();
        assert_eq!(rec.month_year, None);
        assert_eq!(rec.year, None);
    }

    #[test]
    fn deriving_twice_is_idempotent() {
        let once = Record {
            date: NaiveDate::from_ymd_opt(2016, 11, 30),
            ..Record::default()
        }
        .with_derived();
        let twice = once.clone().with_derived();

        assert_eq!(once.month_year, twice.month_year);
        assert_eq!(once.year, twice.year);
    }

    #[test]
    fn unique_values_cover_all_dimensions() {
        let records = vec![
            Record {
                region: "Northern Metropolitan".into(),
                property_type: "h".into(),
                rooms: Some(3),
                bathroom: 1.0,
                date: NaiveDate::from_ymd_opt(2016, 5, 7),
                ..Record::default()
            }
            .with_derived(),
            Record {
                region: "Southern Metropolitan".into(),
                property_type: "u".into(),
                rooms: None,
                bathroom: 2.0,
                ..Record::default()
            }
            .with_derived(),
        ];
        let ds = HousingDataset::from_records(records);

        let years = &ds.unique_values[&FilterDimension::Year];
        assert!(years.contains(&FieldValue::Int(2016)));
        assert!(years.contains(&FieldValue::Null));

        let rooms = &ds.unique_values[&FilterDimension::Rooms];
        assert!(rooms.contains(&FieldValue::Int(3)));
        assert!(rooms.contains(&FieldValue::Null));
    }
}
