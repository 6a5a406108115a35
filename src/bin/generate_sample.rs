use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SalesItem {
    #[serde(rename = "ItemID")]
    item_id: u32,
    brand_name: &'static str,
    category_name: &'static str,
    model_name: &'static str,
    quantity: u32,
    unit_price: f64,
    discount: f64,
    sub_total: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct UserProfile {
    #[serde(rename = "UserID")]
    user_id: u32,
    name: String,
    age: u32,
    gender: &'static str,
    income_bracket: &'static str,
    smoker_label: &'static str,
    household_income: f64,
}

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

    fn range(&mut self, lo: u32, hi: u32) -> u32 {
        lo + (self.next_u64() % u64::from(hi - lo + 1)) as u32
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// (brand, category, model, base price)
const CATALOG: &[(&str, &str, &str, f64)] = &[
    ("Bic", "Disposable", "J26 Maxi", 6.5),
    ("Bic", "Disposable", "J25 Slim", 5.0),
    ("Bic", "Electronic", "J38 Mini", 4.0),
    ("Clipper", "Refillable", "Classic Large", 12.0),
    ("Clipper", "Refillable", "Micro", 9.5),
    ("Zippo", "Refillable", "Armor Chrome", 189.9),
    ("Zippo", "Refillable", "Street Brass", 149.0),
    ("Cricket", "Disposable", "Original", 5.5),
    ("Colibri", "Torch", "Daytona", 320.0),
    ("Tokai", "Electronic", "Piezo Plus", 7.5),
];

fn write_sales(path: &Path, rng: &mut SimpleRng) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let rows = 400;
    for item_id in 1..=rows {
        let &(brand_name, category_name, model_name, base) = rng.pick(CATALOG);
        let quantity = rng.range(1, 12);
        let unit_price = round2(base * (0.9 + 0.2 * rng.next_f64()));
        let discount = if rng.next_f64() < 0.3 {
            round2(unit_price * quantity as f64 * 0.1)
        } else {
            0.0
        };
        writer.serialize(SalesItem {
            item_id,
            brand_name,
            category_name,
            model_name,
            quantity,
            unit_price,
            discount,
            sub_total: round2(unit_price * quantity as f64 - discount),
        })?;
    }
    writer.flush()?;
    Ok(rows as usize)
}

fn write_profiles(path: &Path, rng: &mut SimpleRng) -> Result<usize> {
    let first_names = ["Ana", "Bruno", "Carla", "Diego", "Elisa", "Felipe", "Gabriela", "Hugo"];
    let last_names = ["Silva", "Souza", "Costa", "Oliveira", "Pereira", "Lima"];
    let genders = ["Female", "Male", "Other"];
    let smoker_labels = ["Smoker", "Non-smoker"];

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let rows = 250;
    for user_id in 1..=rows {
        let household_income = round2(1500.0 + 23500.0 * rng.next_f64().powi(2));
        let income_bracket = match household_income {
            x if x < 3000.0 => "Low",
            x if x < 8000.0 => "Medium",
            x if x < 15000.0 => "High",
            _ => "Very High",
        };
        writer.serialize(UserProfile {
            user_id,
            name: format!("{} {}", rng.pick(&first_names), rng.pick(&last_names)),
            age: rng.range(18, 75),
            gender: *rng.pick(&genders),
            income_bracket,
            smoker_label: *rng.pick(&smoker_labels),
            household_income,
        })?;
    }
    writer.flush()?;
    Ok(rows as usize)
}

/// Write deterministic sample datasets: `generate_sample [output_dir]`.
fn main() -> Result<()> {
    env_logger::init();

    let out_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);

    let sales_path = out_dir.join("sales_items.csv");
    let n_sales = write_sales(&sales_path, &mut rng)?;
    let profile_path = out_dir.join("user_profile.csv");
    let n_users = write_profiles(&profile_path, &mut rng)?;

    log::info!("sample data written to {}", out_dir.display());
    println!(
        "Wrote {n_sales} sales items to {} and {n_users} user profiles to {}",
        sales_path.display(),
        profile_path.display()
    );
    Ok(())
}
