/// Configuration for the history system.
use sketch_pad_config::EngineConfig;

/// Maximum number of batches kept on the undo stack.
const DEFAULT_MAX_HISTORY_DEPTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Max batches on the undo stack; the oldest are evicted first.
    pub max_history_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_history_depth: DEFAULT_MAX_HISTORY_DEPTH,
        }
    }
}

impl From<&EngineConfig> for HistoryConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            max_history_depth: config.max_history_depth.max(1),
        }
    }
}
