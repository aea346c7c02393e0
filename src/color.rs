use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::FieldValue;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: dimension value → Color32
// ---------------------------------------------------------------------------

/// Maps the unique values of a categorical dimension to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<FieldValue, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map from a dimension's unique values.
    pub fn new(unique_values: &std::collections::BTreeSet<FieldValue>) -> Self {
        let palette = generate_palette(unique_values.len());
        let mapping: BTreeMap<FieldValue, Color32> = unique_values
            .iter()
            .zip(palette.into_iter())
            .map(|(v, c): (&FieldValue, Color32)| (v.clone(), c))
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given dimension value.
    pub fn color_for(&self, value: &FieldValue) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn palette_size_matches_request() {
        assert!(generate_palette(0).is_empty());
        assert_eq!(generate_palette(7).len(), 7);
    }

    #[test]
    fn unknown_values_fall_back_to_the_default() {
        let values = BTreeSet::from([
            FieldValue::Text("h".into()),
            FieldValue::Text("u".into()),
        ]);
        let cm = ColorMap::new(&values);
        assert_ne!(
            cm.color_for(&FieldValue::Text("h".into())),
            cm.color_for(&FieldValue::Text("u".into()))
        );
        assert_eq!(cm.color_for(&FieldValue::Text("t".into())), Color32::GRAY);
    }
}
