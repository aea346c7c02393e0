use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, ArrayRef, AsArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{HousingDataset, Record};

/// Columns every source file must carry. Anything else in the file is
/// ignored.
pub const REQUIRED_COLUMNS: [&str; 11] = [
    "Suburb",
    "Rooms",
    "Type",
    "Price",
    "Distance",
    "Bathroom",
    "Landsize",
    "BuildingArea",
    "YearBuilt",
    "Regionname",
    "Date",
];

/// Source files mix day-first slashed dates with ISO dates.
const DATE_FORMATS: [&str; 4] = ["%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y", "%d/%m/%y"];

/// A required column is absent from the source file. Raised before any row
/// is parsed so a schema mismatch fails loudly instead of producing a
/// half-empty dataset.
#[derive(Debug, Error)]
#[error("dataset is missing required column '{0}'")]
pub struct MissingColumn(pub String);

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a housing dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – one row per sale, plain scalar columns
/// * `.json`    – records orientation: `[{ "Suburb": ..., ... }, ...]`
/// * `.csv`     – header row with the column names above
pub fn load_file(path: &Path) -> Result<HousingDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// Field parsing helpers
// ---------------------------------------------------------------------------

/// Try every recognized format in turn. `None` when all of them fail;
/// a bad date never fails the whole load.
pub fn parse_mixed_date(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn parse_date_field(s: &str, row: usize) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    let date = parse_mixed_date(s);
    if date.is_none() {
        log::debug!("row {row}: unparseable date '{s}', treating as missing");
    }
    date
}

fn parse_float(s: &str) -> Option<f64> {
    if s.is_empty() {
        None
    } else {
        s.parse().ok()
    }
}

/// Integer columns sometimes arrive as "3.0"; accept both spellings.
fn parse_int(s: &str) -> Option<i64> {
    if s.is_empty() {
        return None;
    }
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<HousingDataset> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    read_csv(reader)
}

fn read_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<HousingDataset> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let column = |name: &str| -> Result<usize, MissingColumn> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| MissingColumn(name.to_string()))
    };

    let suburb_idx = column("Suburb")?;
    let rooms_idx = column("Rooms")?;
    let type_idx = column("Type")?;
    let price_idx = column("Price")?;
    let distance_idx = column("Distance")?;
    let bathroom_idx = column("Bathroom")?;
    let landsize_idx = column("Landsize")?;
    let building_idx = column("BuildingArea")?;
    let year_built_idx = column("YearBuilt")?;
    let region_idx = column("Regionname")?;
    let date_idx = column("Date")?;

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;
        let field = |idx: usize| row.get(idx).unwrap_or("").trim();

        records.push(
            Record {
                suburb: field(suburb_idx).to_string(),
                rooms: parse_int(field(rooms_idx)),
                property_type: field(type_idx).to_string(),
                price: parse_float(field(price_idx)),
                distance: parse_float(field(distance_idx)),
                bathroom: parse_float(field(bathroom_idx)).unwrap_or(0.0),
                land_size: parse_float(field(landsize_idx)),
                building_area: parse_float(field(building_idx)),
                year_built: parse_float(field(year_built_idx)),
                region: field(region_idx).to_string(),
                date: parse_date_field(field(date_idx), row_no),
                ..Record::default()
            }
            .with_derived(),
        );
    }

    Ok(HousingDataset::from_records(records))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default
/// `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "Suburb": "Abbotsford",
///     "Rooms": 2,
///     "Type": "h",
///     "Price": 1035000.0,
///     "Date": "4/02/2016",
///     ...
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<HousingDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let rows = root.as_array().context("Expected top-level JSON array")?;

    if let Some(first) = rows.first() {
        let obj = first.as_object().context("Row 0 is not a JSON object")?;
        for col in REQUIRED_COLUMNS {
            if !obj.contains_key(col) {
                return Err(MissingColumn(col.to_string()).into());
            }
        }
    }

    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let text_of = |key: &str| {
            obj.get(key)
                .and_then(JsonValue::as_str)
                .unwrap_or("")
                .to_string()
        };
        let float_of = |key: &str| obj.get(key).and_then(JsonValue::as_f64);
        let int_of = |key: &str| {
            obj.get(key)
                .and_then(JsonValue::as_i64)
                .or_else(|| float_of(key).map(|f| f as i64))
        };

        let date_text = text_of("Date");
        records.push(
            Record {
                suburb: text_of("Suburb"),
                rooms: int_of("Rooms"),
                property_type: text_of("Type"),
                price: float_of("Price"),
                distance: float_of("Distance"),
                bathroom: float_of("Bathroom").unwrap_or(0.0),
                land_size: float_of("Landsize"),
                building_area: float_of("BuildingArea"),
                year_built: float_of("YearBuilt"),
                region: text_of("Regionname"),
                date: parse_date_field(date_text.trim(), i),
                ..Record::default()
            }
            .with_derived(),
        );
    }

    Ok(HousingDataset::from_records(records))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one row per sale and plain scalar columns.
/// Dates are stored as text and parsed the same way as CSV. Works with
/// files written by both **Pandas** (`df.to_parquet()`) and **Polars**
/// (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<HousingDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    let schema = builder.schema().clone();
    let column = |name: &str| -> Result<usize, MissingColumn> {
        schema
            .index_of(name)
            .map_err(|_| MissingColumn(name.to_string()))
    };

    let suburb_idx = column("Suburb")?;
    let rooms_idx = column("Rooms")?;
    let type_idx = column("Type")?;
    let price_idx = column("Price")?;
    let distance_idx = column("Distance")?;
    let bathroom_idx = column("Bathroom")?;
    let landsize_idx = column("Landsize")?;
    let building_idx = column("BuildingArea")?;
    let year_built_idx = column("YearBuilt")?;
    let region_idx = column("Regionname")?;
    let date_idx = column("Date")?;

    let reader = builder.build().context("building parquet reader")?;
    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let base = records.len();

        for row in 0..batch.num_rows() {
            let date_text = string_at(batch.column(date_idx), row).unwrap_or_default();
            records.push(
                Record {
                    suburb: string_at(batch.column(suburb_idx), row).unwrap_or_default(),
                    rooms: int_at(batch.column(rooms_idx), row),
                    property_type: string_at(batch.column(type_idx), row).unwrap_or_default(),
                    price: float_at(batch.column(price_idx), row),
                    distance: float_at(batch.column(distance_idx), row),
                    bathroom: float_at(batch.column(bathroom_idx), row).unwrap_or(0.0),
                    land_size: float_at(batch.column(landsize_idx), row),
                    building_area: float_at(batch.column(building_idx), row),
                    year_built: float_at(batch.column(year_built_idx), row),
                    region: string_at(batch.column(region_idx), row).unwrap_or_default(),
                    date: parse_date_field(date_text.trim(), base + row),
                    ..Record::default()
                }
                .with_derived(),
            );
        }
    }

    Ok(HousingDataset::from_records(records))
}

// -- Arrow helpers --

fn string_at(col: &ArrayRef, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Utf8 => col
            .as_any()
            .downcast_ref::<StringArray>()
            .map(|a| a.value(row).to_string()),
        DataType::LargeUtf8 => Some(col.as_string::<i64>().value(row).to_string()),
        _ => None,
    }
}

fn float_at(col: &ArrayRef, row: usize) -> Option<f64> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .map(|a| a.value(row)),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .map(|a| f64::from(a.value(row))),
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .map(|a| a.value(row) as f64),
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .map(|a| f64::from(a.value(row))),
        _ => None,
    }
}

fn int_at(col: &ArrayRef, row: usize) -> Option<i64> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .map(|a| a.value(row)),
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .map(|a| i64::from(a.value(row))),
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .map(|a| a.value(row) as i64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "Suburb,Rooms,Type,Price,Distance,Bathroom,Landsize,BuildingArea,YearBuilt,Regionname,Date";

    fn dataset_from(csv_text: &str) -> Result<HousingDataset> {
        read_csv(csv::Reader::from_reader(csv_text.as_bytes()))
    }

    #[test]
    fn loads_a_well_formed_csv() {
        let text = format!(
            "{HEADER}\n\
             Abbotsford,2,h,1035000,2.5,1,156,79,1900,Northern Metropolitan,4/02/2016\n\
             Armadale,3,u,,7.4,2,245,150,1910,Southern Metropolitan,2017-06-10\n"
        );
        let ds = dataset_from(&text).unwrap();
        assert_eq!(ds.len(), 2);

        let first = &ds.records[0];
        assert_eq!(first.suburb, "Abbotsford");
        assert_eq!(first.rooms, Some(2));
        assert_eq!(first.price, Some(1_035_000.0));
        assert_eq!(first.year, Some(2016));
        assert_eq!(first.month_year.as_deref(), Some("2016-02"));

        // Missing price stays missing; ISO date parses too.
        let second = &ds.records[1];
        assert_eq!(second.price, None);
        assert_eq!(second.year, Some(2017));
    }

    #[test]
    fn missing_bathroom_becomes_zero() {
        let text = format!(
            "{HEADER}\n\
             Abbotsford,2,h,1000000,2.5,,156,79,1900,Northern Metropolitan,4/02/2016\n"
        );
        let ds = dataset_from(&text).unwrap();
        assert_eq!(ds.records[0].bathroom, 0.0);
    }

    #[test]
    fn missing_column_fails_fast_with_the_column_name() {
        let text = "Suburb,Rooms,Type,Price,Distance,Bathroom,Landsize,BuildingArea,YearBuilt,Regionname\n\
                    Abbotsford,2,h,1000000,2.5,1,156,79,1900,Northern Metropolitan\n";
        let err = dataset_from(text).unwrap_err();
        assert!(err.to_string().contains("Date"), "got: {err}");
    }

    #[test]
    fn unparseable_date_is_row_local_not_fatal() {
        let text = format!(
            "{HEADER}\n\
             Abbotsford,2,h,1000000,2.5,1,156,79,1900,Northern Metropolitan,not-a-date\n\
             Armadale,3,h,2000000,7.4,2,245,150,1910,Southern Metropolitan,5/03/2017\n"
        );
        let ds = dataset_from(&text).unwrap();
        assert_eq!(ds.records[0].date, None);
        assert_eq!(ds.records[0].year, None);
        assert_eq!(ds.records[0].month_year, None);
        assert_eq!(ds.records[1].year, Some(2017));
    }

    #[test]
    fn negative_values_pass_through_unchanged() {
        let text = format!(
            "{HEADER}\n\
             Abbotsford,2,h,-5,-1.0,1,-20,79,1900,Northern Metropolitan,4/02/2016\n"
        );
        let ds = dataset_from(&text).unwrap();
        assert_eq!(ds.records[0].price, Some(-5.0));
        assert_eq!(ds.records[0].distance, Some(-1.0));
        assert_eq!(ds.records[0].land_size, Some(-20.0));
    }

    #[test]
    fn mixed_date_formats_parse() {
        assert_eq!(
            parse_mixed_date("4/02/2016"),
            NaiveDate::from_ymd_opt(2016, 2, 4)
        );
        assert_eq!(
            parse_mixed_date("2016-02-04"),
            NaiveDate::from_ymd_opt(2016, 2, 4)
        );
        assert_eq!(
            parse_mixed_date("04-02-2016"),
            NaiveDate::from_ymd_opt(2016, 2, 4)
        );
        assert_eq!(parse_mixed_date("февраль"), None);
        assert_eq!(parse_mixed_date("13/13/2016"), None);
    }

    #[test]
    fn loads_records_oriented_json() {
        let text = r#"[
            {"Suburb": "Abbotsford", "Rooms": 2, "Type": "h", "Price": 1035000.0,
             "Distance": 2.5, "Bathroom": null, "Landsize": 156.0,
             "BuildingArea": 79.0, "YearBuilt": 1900.0,
             "Regionname": "Northern Metropolitan", "Date": "4/02/2016"}
        ]"#;
        let tmp = std::env::temp_dir().join("housescope_test_sales.json");
        std::fs::write(&tmp, text).unwrap();
        let ds = load_file(&tmp).unwrap();
        std::fs::remove_file(&tmp).ok();

        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records[0].bathroom, 0.0);
        assert_eq!(ds.records[0].year, Some(2016));
    }

    #[test]
    fn json_missing_column_fails_fast() {
        let text = r#"[{"Suburb": "Abbotsford"}]"#;
        let tmp = std::env::temp_dir().join("housescope_test_bad.json");
        std::fs::write(&tmp, text).unwrap();
        let err = load_file(&tmp).unwrap_err();
        std::fs::remove_file(&tmp).ok();
        assert!(err.to_string().contains("missing required column"));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = load_file(Path::new("sales.xlsx")).unwrap_err();
        assert!(err.to_string().contains("Unsupported file extension"));
    }
}
