//! Loading service configuration (prompts, grading mode, generation policy) from TOML.
//!
//! Every table and key is optional; missing values fall back to defaults.
//! Environment variables override the file for the knobs operators touch most.
//!
//! ```toml
//! [grading]
//! mode = "ai"
//!
//! [generation]
//! malformed_retries = 1
//!
//! [prompts]
//! spoken_answer = "..."
//! ```

use std::{fmt, str::FromStr};

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::prompts::Prompts;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub grading: GradingSettings,
  #[serde(default)]
  pub generation: GenerationSettings,
  #[serde(default)]
  pub provider: ProviderSettings,
  #[serde(default)]
  pub server: ServerSettings,
}

/// Which grading strategy `/evaluate` and the quiz pages use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradingMode {
  /// Case-insensitive comparison against the stored answer key.
  #[default]
  Local,
  /// The completion provider judges each answer.
  Ai,
}

impl FromStr for GradingMode {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "local" => Ok(GradingMode::Local),
      "ai" => Ok(GradingMode::Ai),
      other => Err(format!("unknown grading mode '{other}' (expected 'local' or 'ai')")),
    }
  }
}

impl fmt::Display for GradingMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      GradingMode::Local => "local",
      GradingMode::Ai => "ai",
    })
  }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct GradingSettings {
  #[serde(default)]
  pub mode: GradingMode,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct GenerationSettings {
  /// Extra attempts for a single template whose output fails to parse or validate.
  /// Provider errors are never retried.
  #[serde(default)]
  pub malformed_retries: u32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
  pub base_url: String,
  pub model: String,
  pub temperature: f32,
  pub timeout_secs: u64,
}

impl Default for ProviderSettings {
  fn default() -> Self {
    Self {
      base_url: "https://api.openai.com/v1".into(),
      model: "gpt-4o-mini".into(),
      temperature: 0.8,
      timeout_secs: 60,
    }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
  /// Directory served for everything the router does not handle.
  pub static_dir: String,
  /// Rendered batches kept in memory for form submissions; the oldest is dropped first.
  pub max_live_batches: usize,
}

impl Default for ServerSettings {
  fn default() -> Self {
    Self { static_dir: "./public".into(), max_live_batches: 32 }
  }
}

/// Load `AppConfig` from QUIZ_CONFIG_PATH (if set) and apply env overrides.
/// A file that cannot be read or parsed is logged and ignored.
pub fn load_config_from_env() -> AppConfig {
  let mut cfg = match std::env::var("QUIZ_CONFIG_PATH") {
    Ok(path) => match std::fs::read_to_string(&path) {
      Ok(s) => match toml::from_str::<AppConfig>(&s) {
        Ok(cfg) => {
          info!(target: "quizgen", %path, "Loaded quiz config (TOML)");
          cfg
        }
        Err(e) => {
          error!(target: "quizgen", %path, error = %e, "Failed to parse TOML config; using defaults");
          AppConfig::default()
        }
      },
      Err(e) => {
        error!(target: "quizgen", %path, error = %e, "Failed to read TOML config file; using defaults");
        AppConfig::default()
      }
    },
    Err(_) => AppConfig::default(),
  };

  if let Ok(raw) = std::env::var("GRADING_MODE") {
    match raw.parse::<GradingMode>() {
      Ok(mode) => cfg.grading.mode = mode,
      Err(e) => warn!(target: "quizgen", error = %e, "Ignoring GRADING_MODE"),
    }
  }
  if let Ok(dir) = std::env::var("STATIC_DIR") {
    cfg.server.static_dir = dir;
  }

  cfg
}
