//! Deterministic-under-seed sample transaction generator for demos.
//!
//! Produces raw CSV in the loose source format (no `day`/`revenue` columns)
//! so the loading path exercises the normalizer exactly like an upload.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Days, Local, NaiveDate, Weekday};
use log::info;
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::Result;

pub const SAMPLE_PRODUCTS: &[(&str, &str)] = &[
    ("Coca Cola 500ml", "Beverages"),
    ("Lays Classic 50g", "Snacks"),
    ("Maggi 2-Minute Noodles", "Food"),
    ("Parle-G Biscuits 100g", "Snacks"),
    ("Tata Tea 250g", "Beverages"),
    ("Dettol Soap 100g", "Personal Care"),
    ("Colgate Toothpaste 100g", "Personal Care"),
    ("Rice 1kg", "Food"),
    ("Cooking Oil 1L", "Food"),
    ("Bread Loaf", "Food"),
    ("Milk 1L", "Dairy"),
    ("Eggs 12pcs", "Dairy"),
    ("Onions 1kg", "Vegetables"),
    ("Tomatoes 1kg", "Vegetables"),
    ("Potatoes 1kg", "Vegetables"),
];

pub const PAYMENT_METHODS: &[&str] = &["Cash", "Card", "UPI", "Wallet"];

const QUANTITY_CHOICES: &[i64] = &[1, 2, 3, 4, 5];
const QUANTITY_WEIGHTS: &[u32] = &[50, 25, 15, 7, 3];
const DISCOUNT_CHOICES: &[u32] = &[0, 5, 10, 15];
const DISCOUNT_WEIGHTS: &[u32] = &[70, 20, 8, 2];

/// One generated row in source-CSV shape.
#[derive(Debug, Clone)]
pub struct SampleTransaction {
    pub date: NaiveDate,
    pub product: &'static str,
    pub category: &'static str,
    pub quantity: i64,
    pub unit_price: f64,
    pub discount: u32,
    pub payment_method: &'static str,
}

/// Bundled demo scenarios mirroring the dashboard's sample picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleScenario {
    NormalWeek,
    WeekendBoost,
    SlowWeek,
    HighValueOrders,
}

impl SampleScenario {
    pub const ALL: [SampleScenario; 4] = [
        SampleScenario::NormalWeek,
        SampleScenario::WeekendBoost,
        SampleScenario::SlowWeek,
        SampleScenario::HighValueOrders,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::NormalWeek => "Normal Week",
            Self::WeekendBoost => "Weekend Boost",
            Self::SlowWeek => "Slow Week",
            Self::HighValueOrders => "High Value Orders",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::NormalWeek => "shop_sample.csv",
            Self::WeekendBoost => "demo_weekend_boost.csv",
            Self::SlowWeek => "demo_slow_week.csv",
            Self::HighValueOrders => "demo_high_value.csv",
        }
    }

    fn shape(&self) -> (u64, usize) {
        match self {
            Self::NormalWeek => (7, 20),
            Self::WeekendBoost => (3, 35),
            Self::SlowWeek => (5, 8),
            Self::HighValueOrders => (4, 15),
        }
    }
}

/// Generate `num_days` of transactions ending today, `per_day` on weekdays
/// and 1.5x that on weekends.
pub fn generate_rows(
    num_days: u64,
    per_day: usize,
    rng: &mut impl Rng,
) -> Vec<SampleTransaction> {
    let start = Local::now()
        .date_naive()
        .checked_sub_days(Days::new(num_days.saturating_sub(1)))
        .unwrap_or_else(|| Local::now().date_naive());

    let quantity_dist = WeightedIndex::new(QUANTITY_WEIGHTS).expect("static weights");
    let discount_dist = WeightedIndex::new(DISCOUNT_WEIGHTS).expect("static weights");

    let mut rows = Vec::new();
    for day_offset in 0..num_days {
        let date = start
            .checked_add_days(Days::new(day_offset))
            .unwrap_or(start);
        let weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
        let count = if weekend { per_day * 3 / 2 } else { per_day };

        for _ in 0..count {
            let &(product, category) = SAMPLE_PRODUCTS
                .choose(rng)
                .unwrap_or(&SAMPLE_PRODUCTS[0]);
            let base_price: f64 = match category {
                "Beverages" => rng.gen_range(15.0..50.0),
                "Snacks" => rng.gen_range(10.0..30.0),
                "Food" => rng.gen_range(20.0..150.0),
                "Personal Care" => rng.gen_range(25.0..100.0),
                "Dairy" => rng.gen_range(30.0..80.0),
                "Vegetables" => rng.gen_range(15.0..60.0),
                _ => rng.gen_range(10.0..100.0),
            };

            rows.push(SampleTransaction {
                date,
                product,
                category,
                quantity: QUANTITY_CHOICES[quantity_dist.sample(rng)],
                unit_price: (base_price * 100.0).round() / 100.0,
                discount: DISCOUNT_CHOICES[discount_dist.sample(rng)],
                payment_method: PAYMENT_METHODS
                    .choose(rng)
                    .copied()
                    .unwrap_or(PAYMENT_METHODS[0]),
            });
        }
    }
    rows
}

/// Serialize generated rows to the loose upload CSV format.
pub fn rows_to_csv(rows: &[SampleTransaction]) -> String {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let _ = writer.write_record([
        "date",
        "product",
        "category",
        "quantity",
        "unit_price",
        "discount",
        "payment_method",
    ]);
    for row in rows {
        let _ = writer.write_record([
            row.date.format("%Y-%m-%d").to_string(),
            row.product.to_string(),
            row.category.to_string(),
            row.quantity.to_string(),
            row.unit_price.to_string(),
            row.discount.to_string(),
            row.payment_method.to_string(),
        ]);
    }
    String::from_utf8(writer.into_inner().unwrap_or_default()).unwrap_or_default()
}

/// CSV text for one demo scenario.
pub fn generate_scenario_csv(scenario: SampleScenario, rng: &mut impl Rng) -> String {
    let (days, per_day) = scenario.shape();
    rows_to_csv(&generate_rows(days, per_day, rng))
}

/// Write any missing scenario files under `dir` (the launcher's
/// pre-generation step). Existing files are left alone. Returns the paths
/// written.
pub fn ensure_sample_files(dir: &Path, rng: &mut impl Rng) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    for scenario in SampleScenario::ALL {
        let path = dir.join(scenario.file_name());
        if path.exists() {
            continue;
        }
        fs::write(&path, generate_scenario_csv(scenario, rng))?;
        info!("generated sample dataset {}", path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kpi::compute_kpis;
    use crate::normalize::load_transactions_from_csv;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_rows_deterministic_under_seed() {
        let a = rows_to_csv(&generate_rows(3, 5, &mut StdRng::seed_from_u64(7)));
        let b = rows_to_csv(&generate_rows(3, 5, &mut StdRng::seed_from_u64(7)));
        assert_eq!(a, b);
    }

    #[test]
    fn test_generated_csv_normalizes_cleanly() {
        let csv_text = generate_scenario_csv(SampleScenario::SlowWeek, &mut StdRng::seed_from_u64(1));
        let table = load_transactions_from_csv(csv_text.as_bytes()).unwrap();
        assert!(!table.is_empty());
        // 5 weekdays-or-weekend days at 8 or 12 rows each.
        assert!(table.len() >= 40);

        let kpis = compute_kpis(&table);
        assert!(kpis.total_revenue > 0.0);
        assert!(kpis.top_product.is_some());
        assert!(kpis.top_category.is_some());

        for row in table.rows() {
            assert!(row.quantity >= 1 && row.quantity <= 5);
            assert!(row.unit_price > 0.0);
            assert!(row.category.is_some());
            assert!(row.payment_method.is_some());
        }
    }

    #[test]
    fn test_scenario_names_unique() {
        for accessor in [SampleScenario::file_name, SampleScenario::label] {
            let mut names: Vec<_> = SampleScenario::ALL.iter().map(|s| accessor(s)).collect();
            names.sort();
            names.dedup();
            assert_eq!(names.len(), 4);
        }
    }

    #[test]
    fn test_ensure_sample_files_writes_once() {
        let dir = std::env::temp_dir().join(format!(
            "retail-insights-samples-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);

        let mut rng = StdRng::seed_from_u64(42);
        let written = ensure_sample_files(&dir, &mut rng).unwrap();
        assert_eq!(written.len(), 4);

        let again = ensure_sample_files(&dir, &mut rng).unwrap();
        assert!(again.is_empty());

        let _ = fs::remove_dir_all(&dir);
    }
}
