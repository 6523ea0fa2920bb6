use crate::ability::DEFAULT_LEARNING_RATE;

/// Filter used when `RUST_LOG` is unset: this crate at info, the pool quieter.
pub const DEFAULT_LOG_FILTER: &str = "knowledge_mastery=info,sqlx=warn";

#[derive(Debug, Clone)]
pub struct MasteryConfig {
    /// Base step size before per-concept weighting.
    pub learning_rate: f64,
    pub log_level: String,
}

impl Default for MasteryConfig {
    fn default() -> Self {
        Self {
            learning_rate: DEFAULT_LEARNING_RATE,
            log_level: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl MasteryConfig {
    /// Reads `MASTERY_LEARNING_RATE` and `RUST_LOG`, after loading a `.env`
    /// file if one is present. A missing, unparsable, non-finite or
    /// non-positive rate falls back to the default.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let learning_rate = std::env::var("MASTERY_LEARNING_RATE")
            .ok()
            .and_then(|value| parse_learning_rate(&value))
            .unwrap_or(DEFAULT_LEARNING_RATE);

        let log_level =
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());

        Self {
            learning_rate,
            log_level,
        }
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }
}

fn parse_learning_rate(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|rate| rate.is_finite() && *rate > 0.0)
}
