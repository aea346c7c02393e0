// ---------------------------------------------------------------------------
// Price estimator – pluggable scoring model for the calculator page
// ---------------------------------------------------------------------------

/// Inputs the calculator page collects from the user.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EstimateInput {
    pub distance_km: f64,
    pub land_size: f64,
    pub building_area: f64,
}

/// A price-scoring model. The UI holds one behind a `Box<dyn PriceModel>`
/// so the formula can be swapped without touching the calculator page.
pub trait PriceModel {
    fn name(&self) -> &str;
    fn estimate(&self, input: &EstimateInput) -> f64;
}

/// Flat per-unit rates: so many dollars per km of distance, per m² of land,
/// per m² of building. A rough heuristic, not a fitted model.
#[derive(Debug, Clone, Copy)]
pub struct LinearRateModel {
    pub distance_rate: f64,
    pub land_rate: f64,
    pub building_rate: f64,
}

impl Default for LinearRateModel {
    fn default() -> Self {
        LinearRateModel {
            distance_rate: 10_000.0,
            land_rate: 300.0,
            building_rate: 500.0,
        }
    }
}

impl PriceModel for LinearRateModel {
    fn name(&self) -> &str {
        "Linear rates"
    }

    fn estimate(&self, input: &EstimateInput) -> f64 {
        input.distance_km * self.distance_rate
            + input.land_size * self.land_rate
            + input.building_area * self.building_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rates_match_the_documented_formula() {
        let model = LinearRateModel::default();
        let input = EstimateInput {
            distance_km: 2.0,
            land_size: 100.0,
            building_area: 80.0,
        };
        // 2*10000 + 100*300 + 80*500
        assert_eq!(model.estimate(&input), 90_000.0);
    }

    #[test]
    fn zero_input_estimates_zero() {
        let model = LinearRateModel::default();
        assert_eq!(model.estimate(&EstimateInput::default()), 0.0);
    }
}
