use crate::analysis::{AnalysisRequest, AnalysisResponse};
use crate::error::HealthResult;
use crate::training::TrainingReport;
use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;
use std::fs::File;
use std::path::Path;

/// One analysis as handed to an external log: when, what was asked, what was
/// answered.
#[derive(Debug, Serialize)]
pub struct AnalysisRecord<'a> {
    pub timestamp: DateTime<Utc>,
    pub request: &'a AnalysisRequest,
    pub response: &'a AnalysisResponse,
}

impl<'a> AnalysisRecord<'a> {
    pub fn new(request: &'a AnalysisRequest, response: &'a AnalysisResponse) -> Self {
        Self { timestamp: Utc::now(), request, response }
    }
}

pub fn save_analysis<P: AsRef<Path>>(record: &AnalysisRecord<'_>, output_dir: P) -> HealthResult<()> {
    // Create output directory
    let output_path = output_dir.as_ref();
    std::fs::create_dir_all(output_path)?;

    // Save analysis record
    let path = output_path.join("analysis.json");
    save_json(record, &path)?;
    info!("Analysis saved to {:?}", path);
    Ok(())
}

pub fn save_training_report<P: AsRef<Path>>(report: &TrainingReport, output_dir: P) -> HealthResult<()> {
    // Create output directory
    let output_path = output_dir.as_ref();
    std::fs::create_dir_all(output_path)?;

    // Save training report
    let path = output_path.join("training_report.json");
    save_json(report, &path)?;
    info!("Training report saved to {:?}", path);
    Ok(())
}

fn save_json<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> HealthResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}
