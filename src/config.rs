use crate::ai::engine::DEFAULT_NODE_BUDGET;
use crate::engine::types::Color;

/// Runtime configuration parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Search-tree expansion budget per AI move.
    pub node_budget: u32,
    /// Which side the engine plays.
    pub ai_color: Color,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        AppConfig {
            node_budget: std::env::var("GAMBIT_AI_NODE_BUDGET")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_NODE_BUDGET),
            ai_color: std::env::var("GAMBIT_AI_COLOR")
                .ok()
                .and_then(|v| Color::from_str_loose(&v))
                .unwrap_or(Color::Black),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            node_budget: DEFAULT_NODE_BUDGET,
            ai_color: Color::Black,
        }
    }
}
