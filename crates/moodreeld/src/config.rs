use moodreel_core::locator::LocatorConfig;
use moodreel_core::AnalyzerConfig;
use std::path::PathBuf;

/// Daemon configuration, loaded from environment variables.
pub struct Config {
    /// Socket address the HTTP server binds to.
    pub bind_addr: String,
    /// Directory containing the cascade and classifier model files.
    pub model_dir: PathBuf,
    /// Image-pyramid scale step for the face locator.
    pub scale_factor: f32,
    /// Cascade acceptance threshold for the face locator.
    pub min_neighbors: u32,
    /// Smallest face edge considered, in pixels.
    pub min_face_size: u32,
    /// Timeout in seconds for a single analysis request.
    pub analyze_timeout_secs: u64,
    /// Allowed CORS origins for browser clients.
    pub cors_origins: Vec<String>,
    /// Catalog API bearer token; absent disables recommendations.
    pub catalog_token: Option<String>,
    /// Catalog API base URL.
    pub catalog_base_url: String,
}

impl Config {
    /// Load configuration from `MOODREEL_*` environment variables with
    /// defaults. The catalog token keeps its upstream name.
    pub fn from_env() -> Self {
        let model_dir = std::env::var("MOODREEL_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| moodreel_core::default_model_dir());

        let cors_origins = std::env::var("MOODREEL_CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .ok()
            .filter(|origins| !origins.is_empty())
            .unwrap_or_else(|| {
                vec![
                    "http://localhost:5173".to_string(),
                    "http://127.0.0.1:5173".to_string(),
                ]
            });

        Self {
            bind_addr: std::env::var("MOODREEL_BIND_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:5000".to_string()),
            model_dir,
            scale_factor: env_f32("MOODREEL_SCALE_FACTOR", 1.3),
            min_neighbors: env_u32("MOODREEL_MIN_NEIGHBORS", 5),
            min_face_size: env_u32("MOODREEL_MIN_FACE_SIZE", 40),
            analyze_timeout_secs: env_u64("MOODREEL_ANALYZE_TIMEOUT_SECS", 10),
            cors_origins,
            catalog_token: std::env::var("TMDB_BEARER_TOKEN")
                .ok()
                .filter(|token| !token.is_empty()),
            catalog_base_url: std::env::var("TMDB_BASE_URL")
                .unwrap_or_else(|_| moodreel_catalog::DEFAULT_BASE_URL.to_string()),
        }
    }

    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig::from_model_dir(
            &self.model_dir,
            LocatorConfig {
                scale_factor: self.scale_factor,
                min_neighbors: self.min_neighbors,
                min_face_size: self.min_face_size,
            },
        )
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
