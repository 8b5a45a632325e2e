//! Application state: provider, prompts, grader, settings and the live batch store.
//!
//! This module owns:
//!   - the completion provider (OpenAI when a key is present, otherwise a stand-in that fails)
//!   - the prompts struct (from TOML or defaults)
//!   - the grading strategy picked once from `GradingMode`
//!   - rendered batches kept for the server-side quiz page

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::config::{load_config_from_env, AppConfig, GenerationSettings, GradingMode};
use crate::domain::Batch;
use crate::error::QuizError;
use crate::generation::generate_all;
use crate::grading::{build_grader, Grader};
use crate::prompts::Prompts;
use crate::provider::{CompletionProvider, OpenAI, Unconfigured};
use crate::session::{BatchContext, BatchStore};

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn CompletionProvider>,
    pub prompts: Arc<Prompts>,
    pub grader: Arc<dyn Grader>,
    pub generation: GenerationSettings,
    pub static_dir: String,
    pub batches: Arc<RwLock<BatchStore>>,
}

impl AppState {
    /// Build state from env: load config, init the provider, pick the grader.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_config_from_env();

        let provider: Arc<dyn CompletionProvider> = match OpenAI::from_env(&cfg.provider) {
            Some(oa) => {
                info!(target: "quizgen", base_url = %oa.base_url, model = %oa.model, "OpenAI enabled.");
                Arc::new(oa)
            }
            None => {
                warn!(target: "quizgen", "OpenAI disabled (no OPENAI_API_KEY). Generation and AI grading will fail.");
                Arc::new(Unconfigured)
            }
        };

        Self::with_parts(cfg, provider)
    }

    /// Assemble state around an explicit provider.
    pub fn with_parts(cfg: AppConfig, provider: Arc<dyn CompletionProvider>) -> Self {
        let prompts = Arc::new(cfg.prompts);
        let grader = build_grader(cfg.grading.mode, provider.clone(), prompts.clone());
        info!(target: "quizgen", mode = %cfg.grading.mode, provider = %provider.name(), static_dir = %cfg.server.static_dir, "Grading mode selected");

        Self {
            provider,
            prompts,
            grader,
            generation: cfg.generation,
            static_dir: cfg.server.static_dir,
            batches: Arc::new(RwLock::new(BatchStore::new(cfg.server.max_live_batches))),
        }
    }

    pub fn grading_mode(&self) -> GradingMode {
        self.grader.mode()
    }

    /// One full six-type batch from the provider.
    pub async fn generate_batch(&self) -> Result<Batch, QuizError> {
        generate_all(self.provider.as_ref(), &self.prompts, &self.generation).await
    }

    /// Generate a batch and keep it for the quiz page. Returns the batch id.
    #[instrument(level = "info", skip(self))]
    pub async fn start_quiz(&self) -> Result<String, QuizError> {
        let batch = self.generate_batch().await?;
        let ctx = BatchContext::new(batch);
        let id = self.batches.write().await.insert(ctx);
        info!(target: "quizgen", %id, "Quiz batch stored");
        Ok(id)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get_batch(&self, id: &str) -> Option<BatchContext> {
        self.batches.read().await.get(id).cloned()
    }
}
