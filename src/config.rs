use std::env;

/// Runtime configuration, read once at startup from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub database_url: String,
    pub model_path: String,
    pub dataset_path: String,
    /// Whether this deployment collects English scores; controls the
    /// English-proficiency scenario rule.
    pub english_track: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env::var("PATHWAY_BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://university_reports.db?mode=rwc".to_string()),
            model_path: env::var("PATHWAY_MODEL")
                .unwrap_or_else(|_| "models/pathway_model.json".to_string()),
            dataset_path: env::var("PATHWAY_DATASET")
                .unwrap_or_else(|_| "data/collected_students.csv".to_string()),
            english_track: env::var("PATHWAY_ENGLISH_TRACK")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(true),
        }
    }
}
