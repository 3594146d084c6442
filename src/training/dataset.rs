use crate::error::{HealthError, HealthResult};
use crate::schema::{Feature, FeatureVector};
use log::{info, warn};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// One row of the processed health dataset. Gender and smoking history are
/// already encoded as numbers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthRecord {
    pub gender: f64,
    pub age: f64,
    pub hypertension: f64,
    pub heart_disease: f64,
    pub smoking_history: f64,
    pub bmi: f64,
    #[serde(rename = "HbA1c_level")]
    pub hba1c: f64,
    #[serde(rename = "blood_glucose_level")]
    pub blood_glucose: f64,
    pub diabetes: f64,
}

impl HealthRecord {
    pub fn to_row(&self) -> FeatureVector {
        FeatureVector::zeros()
            .with(Feature::Gender, self.gender)
            .with(Feature::Age, self.age)
            .with(Feature::Bmi, self.bmi)
            .with(Feature::SmokingHistory, self.smoking_history)
            .with(Feature::Hba1c, self.hba1c)
            .with(Feature::BloodGlucose, self.blood_glucose)
            .with(Feature::Hypertension, self.hypertension)
            .with(Feature::HeartDisease, self.heart_disease)
            .with(Feature::Diabetes, self.diabetes)
    }

    fn is_finite(&self) -> bool {
        self.to_row().as_array().iter().all(|v| v.is_finite())
    }
}

pub fn load_dataset<P: AsRef<Path>>(path: P) -> HealthResult<Vec<FeatureVector>> {
    let file = File::open(path)?;
    load_dataset_from_reader(BufReader::new(file))
}

pub fn load_dataset_from_reader<R: Read>(reader: R) -> HealthResult<Vec<FeatureVector>> {
    read_rows(csv::Reader::from_reader(reader))
}

/// Rows that fail to parse are skipped; a header without the schema columns
/// is an error.
fn read_rows<R: Read>(mut reader: csv::Reader<R>) -> HealthResult<Vec<FeatureVector>> {
    let headers = reader.headers()?.clone();
    for feature in Feature::ALL {
        if !headers.iter().any(|h| h == feature.column_name()) {
            return Err(HealthError::Training(format!(
                "dataset is missing column '{}'", feature.column_name()
            )));
        }
    }

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for record in reader.deserialize::<HealthRecord>() {
        match record {
            Ok(record) if record.is_finite() => rows.push(record.to_row()),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!("Skipped {} unusable dataset rows", skipped);
    }
    info!("Loaded {} dataset rows", rows.len());
    Ok(rows)
}
