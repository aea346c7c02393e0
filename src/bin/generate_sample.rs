use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn index(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() {
    let mut rng = SimpleRng::new(42);

    // (suburb, region, base price, distance from the centre)
    let suburbs: [(&str, &str, f64, f64); 6] = [
        ("Abbotsford", "Northern Metropolitan", 1_000_000.0, 2.5),
        ("Brunswick", "Northern Metropolitan", 900_000.0, 5.2),
        ("Armadale", "Southern Metropolitan", 1_500_000.0, 7.4),
        ("Brighton", "Southern Metropolitan", 1_800_000.0, 11.2),
        ("Footscray", "Western Metropolitan", 700_000.0, 6.4),
        ("Werribee", "Western Metropolitan", 450_000.0, 25.6),
    ];
    let types: [(&str, f64); 3] = [("h", 1.0), ("u", 0.55), ("t", 0.8)];
    let year_growth: [(i32, f64); 3] = [(2016, 1.0), (2017, 1.1), (2018, 1.16)];

    let mut suburb_col: Vec<Option<String>> = Vec::new();
    let mut rooms_col: Vec<Option<i64>> = Vec::new();
    let mut type_col: Vec<Option<String>> = Vec::new();
    let mut price_col: Vec<Option<f64>> = Vec::new();
    let mut distance_col: Vec<Option<f64>> = Vec::new();
    let mut bathroom_col: Vec<Option<f64>> = Vec::new();
    let mut landsize_col: Vec<Option<f64>> = Vec::new();
    let mut building_col: Vec<Option<f64>> = Vec::new();
    let mut year_built_col: Vec<Option<f64>> = Vec::new();
    let mut region_col: Vec<Option<String>> = Vec::new();
    let mut date_col: Vec<Option<String>> = Vec::new();

    let mut row_count: usize = 0;
    for &(suburb, region, base_price, base_distance) in &suburbs {
        for _ in 0..60 {
            let (ptype, type_mult) = types[rng.index(types.len())];
            let (year, growth) = year_growth[rng.index(year_growth.len())];
            let rooms = 1 + rng.index(5) as i64;
            let bathrooms = 1.0 + rng.index(3) as f64;
            let land = (base_price / 4_000.0) * (0.6 + rng.next_f64());
            let building = land * (0.3 + 0.4 * rng.next_f64());

            let price = base_price * type_mult * growth * (0.75 + 0.1 * rooms as f64)
                + rng.gauss(0.0, base_price * 0.05);

            let day = 1 + rng.index(28);
            let month = 1 + rng.index(12);
            let date = match row_count % 89 {
                // A handful of rows exercise the missing-date path.
                0 => "unknown".to_string(),
                n if n % 7 == 0 => format!("{year}-{month:02}-{day:02}"),
                _ => format!("{day}/{month:02}/{year}"),
            };

            suburb_col.push(Some(suburb.to_string()));
            rooms_col.push(Some(rooms));
            type_col.push(Some(ptype.to_string()));
            price_col.push((rng.next_f64() > 0.05).then_some(price.round()));
            distance_col.push(Some(base_distance + rng.gauss(0.0, 0.4)));
            bathroom_col.push((rng.next_f64() > 0.1).then_some(bathrooms));
            landsize_col.push((rng.next_f64() > 0.05).then_some(land.round()));
            building_col.push((rng.next_f64() > 0.15).then_some(building.round()));
            year_built_col.push(Some(1880.0 + rng.index(135) as f64));
            region_col.push(Some(region.to_string()));
            date_col.push(Some(date));
            row_count += 1;
        }
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("Suburb", DataType::Utf8, true),
        Field::new("Rooms", DataType::Int64, true),
        Field::new("Type", DataType::Utf8, true),
        Field::new("Price", DataType::Float64, true),
        Field::new("Distance", DataType::Float64, true),
        Field::new("Bathroom", DataType::Float64, true),
        Field::new("Landsize", DataType::Float64, true),
        Field::new("BuildingArea", DataType::Float64, true),
        Field::new("YearBuilt", DataType::Float64, true),
        Field::new("Regionname", DataType::Utf8, true),
        Field::new("Date", DataType::Utf8, true),
    ]));

    let as_str = |col: &[Option<String>]| {
        StringArray::from(col.iter().map(|v| v.as_deref()).collect::<Vec<_>>())
    };

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(as_str(&suburb_col)),
            Arc::new(Int64Array::from(rooms_col)),
            Arc::new(as_str(&type_col)),
            Arc::new(Float64Array::from(price_col)),
            Arc::new(Float64Array::from(distance_col)),
            Arc::new(Float64Array::from(bathroom_col)),
            Arc::new(Float64Array::from(landsize_col)),
            Arc::new(Float64Array::from(building_col)),
            Arc::new(Float64Array::from(year_built_col)),
            Arc::new(as_str(&region_col)),
            Arc::new(as_str(&date_col)),
        ],
    )
    .expect("Failed to create RecordBatch");

    // Write Parquet
    let output_path = "sample_sales.parquet";
    let file = std::fs::File::create(output_path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");

    println!("Wrote {row_count} sales to {output_path}");
}
