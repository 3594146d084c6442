use crate::config::ResourceConfig;
use crate::error::HealthResult;
use crate::estimator::estimate;
use crate::foods::{FoodTable, NutritionTotals};
use crate::models::ModelBundle;
use crate::predictor::{predict_if_available, PredictionResult};
use crate::profile::{round_to, Profile, RawProfile};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

/// Read-only state loaded once at startup and shared by every request.
#[derive(Debug, Default)]
pub struct AppState {
    pub foods: FoodTable,
    pub model: Option<ModelBundle>,
}

impl AppState {
    pub fn new(foods: FoodTable, model: Option<ModelBundle>) -> Self {
        Self { foods, model }
    }

    /// Missing or unreadable resources degrade the state instead of failing.
    pub fn load(resources: &ResourceConfig) -> Self {
        let foods = if resources.foods.exists() {
            match FoodTable::from_path(&resources.foods) {
                Ok(table) if table.is_empty() => {
                    warn!("Food data file {:?} has no rows, nothing will match", resources.foods);
                    table
                },
                Ok(table) => {
                    info!("Loaded {} food items from {:?}", table.len(), resources.foods);
                    table
                },
                Err(e) => {
                    error!("Error loading food data from {:?}: {}", resources.foods, e);
                    FoodTable::default()
                },
            }
        } else {
            warn!("Food data file {:?} not found", resources.foods);
            FoodTable::default()
        };

        let model = if resources.model.exists() {
            match ModelBundle::from_file(&resources.model) {
                Ok(bundle) => {
                    info!("Loaded model bundle (diabetes, cardio, hypertension) from {:?}", resources.model);
                    Some(bundle)
                },
                Err(e) => {
                    error!("Error loading model bundle from {:?}: {}", resources.model, e);
                    None
                },
            }
        } else {
            warn!("Model file {:?} not found, predictions disabled", resources.model);
            None
        };

        Self::new(foods, model)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(rename = "userInfo", default)]
    pub user_info: RawProfile,
    #[serde(rename = "foodText", default)]
    pub food_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulatedHealth {
    pub glucose: f64,
    pub hba1c: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub foods: Vec<String>,
    pub nutrition: NutritionTotals,
    pub bmi: f64,
    pub simulated_health: SimulatedHealth,
    pub predictions: PredictionResult,
}

/// Wire shape of one analysis: the report on success, the message otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: Option<AnalysisReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResponse {
    pub fn from_result(result: HealthResult<AnalysisReport>) -> Self {
        match result {
            Ok(report) => Self { success: true, report: Some(report), error: None },
            Err(e) => {
                error!("Analysis error: {}", e);
                Self { success: false, report: None, error: Some(e.to_string()) }
            },
        }
    }
}

/// Extract, estimate, predict. All or nothing: any failure discards the
/// partial results.
pub fn analyze(state: &AppState, request: &AnalysisRequest) -> HealthResult<AnalysisReport> {
    let extraction = state.foods.extract(&request.food_text);
    let profile = Profile::from_raw(&request.user_info);
    let derived = estimate(&profile, &extraction.totals);

    let predictions = predict_if_available(
        &profile,
        &derived,
        state.model.as_ref().map(|m| &m.normalizer),
        state.model.as_ref().map(|m| &m.classifiers),
    )?;

    Ok(AnalysisReport {
        foods: extraction.matched,
        nutrition: extraction.totals,
        bmi: derived.bmi,
        simulated_health: SimulatedHealth {
            glucose: round_to(derived.glucose, 1),
            hba1c: round_to(derived.hba1c, 1),
        },
        predictions,
    })
}

pub fn handle(state: &AppState, request: &AnalysisRequest) -> AnalysisResponse {
    AnalysisResponse::from_result(analyze(state, request))
}
