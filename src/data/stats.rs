use std::collections::{BTreeMap, BTreeSet};

use super::model::HousingDataset;

// ---------------------------------------------------------------------------
// Price summary (KPI tiles)
// ---------------------------------------------------------------------------

/// Summary statistics of the price column over a filtered view.
///
/// Each statistic is `f64::NAN` when the view is empty or contains no priced
/// rows; callers render NaN as "no data" instead of a number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSummary {
    pub mean: f64,
    pub median: f64,
    pub max: f64,
    pub min: f64,
}

impl PriceSummary {
    pub fn no_data() -> Self {
        PriceSummary {
            mean: f64::NAN,
            median: f64::NAN,
            max: f64::NAN,
            min: f64::NAN,
        }
    }
}

/// Compute {mean, median, max, min} of price over the given row indices,
/// ignoring rows with a missing price.
pub fn price_summary(dataset: &HousingDataset, indices: &[usize]) -> PriceSummary {
    let mut prices: Vec<f64> = indices
        .iter()
        .filter_map(|&i| dataset.records[i].price)
        .collect();

    if prices.is_empty() {
        return PriceSummary::no_data();
    }

    prices.sort_by(f64::total_cmp);
    let n = prices.len();
    let median = if n % 2 == 1 {
        prices[n / 2]
    } else {
        (prices[n / 2 - 1] + prices[n / 2]) / 2.0
    };

    PriceSummary {
        mean: prices.iter().sum::<f64>() / n as f64,
        median,
        max: prices[n - 1],
        min: prices[0],
    }
}

// ---------------------------------------------------------------------------
// Group-by means feeding the charts
// ---------------------------------------------------------------------------

/// Running mean accumulator for one group.
#[derive(Debug, Default, Clone, Copy)]
struct MeanAcc {
    sum: f64,
    n: usize,
}

impl MeanAcc {
    fn push(&mut self, v: f64) {
        self.sum += v;
        self.n += 1;
    }

    fn mean(self) -> Option<f64> {
        (self.n > 0).then(|| self.sum / self.n as f64)
    }
}

/// Mean price per region over the view, sorted ascending by mean.
/// Regions whose rows all lack a price are omitted.
pub fn mean_price_by_region(dataset: &HousingDataset, indices: &[usize]) -> Vec<(String, f64)> {
    let mut groups: BTreeMap<&str, MeanAcc> = BTreeMap::new();
    for &i in indices {
        let rec = &dataset.records[i];
        if let Some(price) = rec.price {
            groups.entry(&rec.region).or_default().push(price);
        }
    }

    let mut out: Vec<(String, f64)> = groups
        .into_iter()
        .filter_map(|(region, acc)| acc.mean().map(|m| (region.to_string(), m)))
        .collect();
    out.sort_by(|a, b| a.1.total_cmp(&b.1));
    out
}

/// Sale counts per property type over the view, most frequent first.
pub fn type_counts(dataset: &HousingDataset, indices: &[usize]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for &i in indices {
        *counts
            .entry(&dataset.records[i].property_type)
            .or_default() += 1;
    }

    let mut out: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(t, n)| (t.to_string(), n))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

/// Mean price per month bucket over the view, in chronological order.
/// Rows with a missing month bucket or missing price are excluded.
pub fn mean_price_by_month(dataset: &HousingDataset, indices: &[usize]) -> Vec<(String, f64)> {
    let mut groups: BTreeMap<&str, MeanAcc> = BTreeMap::new();
    for &i in indices {
        let rec = &dataset.records[i];
        if let (Some(month), Some(price)) = (rec.month_year.as_deref(), rec.price) {
            groups.entry(month).or_default().push(price);
        }
    }

    // BTreeMap iteration over "YYYY-MM" keys is already chronological.
    groups
        .into_iter()
        .filter_map(|(month, acc)| acc.mean().map(|m| (month.to_string(), m)))
        .collect()
}

// ---------------------------------------------------------------------------
// Year-over-year change table
// ---------------------------------------------------------------------------

/// Per-suburb comparison between the two earliest observed sale years.
#[derive(Debug, Clone, PartialEq)]
pub struct YearOverYearChange {
    pub suburb: String,
    /// Mean price in the earliest year, missing when the suburb has no
    /// priced sales that year.
    pub first_price: Option<f64>,
    /// Mean price in the second-earliest year.
    pub second_price: Option<f64>,
    /// `first_price − second_price`; missing when either side is missing.
    pub change: Option<f64>,
    /// `change / first_price × 100`, defined as 0 when `first_price` is 0.
    pub percent_change: Option<f64>,
}

/// The full year-over-year table for a filtered view.
#[derive(Debug, Clone, Default)]
pub struct YearOverYearTable {
    /// The two earliest distinct sale years in the view, `None` when fewer
    /// than two years carry observations.
    pub years: Option<(i32, i32)>,
    pub rows: Vec<YearOverYearChange>,
}

impl YearOverYearTable {
    /// Rows ordered by percentage change, descending; suburbs with a missing
    /// change sort last.
    pub fn sorted_by_percent_change(&self) -> Vec<&YearOverYearChange> {
        let mut rows: Vec<&YearOverYearChange> = self.rows.iter().collect();
        rows.sort_by(|a, b| {
            let pa = a.percent_change.unwrap_or(f64::NEG_INFINITY);
            let pb = b.percent_change.unwrap_or(f64::NEG_INFINITY);
            pb.total_cmp(&pa)
        });
        rows
    }

    /// The `n` suburbs with the largest absolute change magnitude.
    pub fn top_by_change_magnitude(&self, n: usize) -> Vec<&YearOverYearChange> {
        let mut rows: Vec<&YearOverYearChange> = self
            .rows
            .iter()
            .filter(|r| r.change.is_some())
            .collect();
        rows.sort_by(|a, b| {
            let ma = a.change.map(f64::abs).unwrap_or(0.0);
            let mb = b.change.map(f64::abs).unwrap_or(0.0);
            mb.total_cmp(&ma)
        });
        rows.truncate(n);
        rows
    }
}

/// Group the view by (suburb, sale year), average price per group, and
/// compare each suburb's two earliest observed years.
///
/// Rows with a missing year never enter the grouping. Suburbs without a
/// priced observation in either comparison year keep a missing change rather
/// than a zero.
pub fn year_over_year(dataset: &HousingDataset, indices: &[usize]) -> YearOverYearTable {
    let mut groups: BTreeMap<(&str, i32), MeanAcc> = BTreeMap::new();
    let mut years: BTreeSet<i32> = BTreeSet::new();
    let mut suburbs: BTreeSet<&str> = BTreeSet::new();

    for &i in indices {
        let rec = &dataset.records[i];
        let Some(year) = rec.year else {
            continue;
        };
        years.insert(year);
        suburbs.insert(&rec.suburb);
        let acc = groups.entry((&rec.suburb, year)).or_default();
        if let Some(price) = rec.price {
            acc.push(price);
        }
    }

    let mut year_iter = years.into_iter();
    let (Some(first_year), Some(second_year)) = (year_iter.next(), year_iter.next()) else {
        return YearOverYearTable::default();
    };

    let rows = suburbs
        .into_iter()
        .map(|suburb| {
            let mean_for = |year: i32| groups.get(&(suburb, year)).and_then(|acc| acc.mean());
            let first_price = mean_for(first_year);
            let second_price = mean_for(second_year);
            let change = match (first_price, second_price) {
                (Some(a), Some(b)) => Some(a - b),
                _ => None,
            };
            let percent_change = match (change, first_price) {
                (Some(_), Some(first)) if first == 0.0 => Some(0.0),
                (Some(c), Some(first)) => Some(c / first * 100.0),
                _ => None,
            };
            YearOverYearChange {
                suburb: suburb.to_string(),
                first_price,
                second_price,
                change,
                percent_change,
            }
        })
        .collect();

    YearOverYearTable {
        years: Some((first_year, second_year)),
        rows,
    }
}
