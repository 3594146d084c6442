use crate::error::HealthResult;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodRecord {
    pub name: String,
    pub calo: f64,
    pub sugar: f64,
    pub fat: f64,
    pub protein: f64,
    pub salt: f64,
}

/// CSV row as read; any blank or unparseable nutrient cell becomes 0.
#[derive(Debug, Deserialize)]
struct FoodRow {
    name: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    calo: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    sugar: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    fat: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    protein: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    salt: Option<f64>,
}

impl From<FoodRow> for FoodRecord {
    fn from(row: FoodRow) -> Self {
        Self {
            name: row.name,
            calo: row.calo.unwrap_or(0.0),
            sugar: row.sugar.unwrap_or(0.0),
            fat: row.fat.unwrap_or(0.0),
            protein: row.protein.unwrap_or(0.0),
            salt: row.salt.unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionTotals {
    pub calo: f64,
    pub sugar: f64,
    pub fat: f64,
    pub protein: f64,
    pub salt: f64,
}

impl NutritionTotals {
    pub fn add(&mut self, food: &FoodRecord) {
        self.calo += food.calo;
        self.sugar += food.sugar;
        self.fat += food.fat;
        self.protein += food.protein;
        self.salt += food.salt;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Extraction {
    pub matched: Vec<String>,
    pub totals: NutritionTotals,
}

#[derive(Debug, Clone, Default)]
pub struct FoodTable {
    records: Vec<FoodRecord>,
}

impl FoodTable {
    pub fn new(records: Vec<FoodRecord>) -> Self {
        Self { records }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> HealthResult<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> HealthResult<Self> {
        Self::from_csv(csv::Reader::from_reader(reader))
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> HealthResult<Self> {
        let mut records = Vec::new();
        for row in reader.deserialize::<FoodRow>() {
            records.push(FoodRecord::from(row?));
        }
        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[FoodRecord] {
        &self.records
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.name.as_str())
    }

    /// Case-insensitive name lookup for autocomplete. Queries shorter than two
    /// characters return nothing.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&str> {
        let query = query.to_lowercase();
        if query.chars().count() < 2 {
            return Vec::new();
        }

        self.names()
            .filter(|name| name.to_lowercase().contains(&query))
            .take(limit)
            .collect()
    }

    pub fn extract(&self, text: &str) -> Extraction {
        extract(text, self.records())
    }
}

/// Every record whose lower-cased name occurs anywhere in the lower-cased
/// text is matched, in table order. Overlapping names each count.
pub fn extract(text: &str, foods: &[FoodRecord]) -> Extraction {
    let text = text.to_lowercase();
    let mut extraction = Extraction::default();

    for food in foods {
        if text.contains(&food.name.to_lowercase()) {
            extraction.matched.push(food.name.clone());
            extraction.totals.add(food);
        }
    }

    debug!("Matched {} foods in input", extraction.matched.len());
    extraction
}
