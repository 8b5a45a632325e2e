//! Public protocol structs for the JSON endpoints (serde ready).
//! Request bodies for `/evaluate` live with the graders (`grading::GradingRequest`);
//! question batches serialize straight from `domain::Batch`.

use serde::Serialize;

use crate::playback::PlaybackStep;

#[derive(Debug, Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub provider: String,
    #[serde(rename = "gradingMode")]
    pub grading_mode: String,
}

/// Body of every JSON error response.
#[derive(Debug, Serialize)]
pub struct ErrorOut {
    pub error: String,
}

/// Ordered playback plan for one audio card.
#[derive(Debug, Serialize)]
pub struct PlaybackOut {
    #[serde(rename = "batchId")]
    pub batch_id: String,
    #[serde(rename = "questionType")]
    pub question_type: String,
    pub steps: Vec<PlaybackStep>,
}
