use std::time::Duration;

/// Configuration for a [`JobStore`](crate::store::JobStore) instance.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path of the remote collection to subscribe to
    pub collection_path: String,
    /// Minimum time the loading skeleton stays visible once an attach starts.
    /// A snapshot arriving earlier waits for this to elapse; a snapshot
    /// arriving later clears the skeleton immediately.
    pub skeleton_min_duration: Duration,
    /// Capacity of the store command channel
    pub command_buffer: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            collection_path: "jobs".to_string(),
            skeleton_min_duration: Duration::from_millis(600),
            command_buffer: 64,
        }
    }
}

impl StoreConfig {
    pub fn with_collection_path(mut self, path: impl Into<String>) -> Self {
        self.collection_path = path.into();
        self
    }

    pub fn with_skeleton_min_duration(mut self, duration: Duration) -> Self {
        self.skeleton_min_duration = duration;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_config_default() {
        let cfg = StoreConfig::default();
        assert_eq!(cfg.collection_path, "jobs");
        assert_eq!(cfg.skeleton_min_duration, Duration::from_millis(600));
        assert_eq!(cfg.command_buffer, 64);
    }

    #[test]
    fn store_config_builders() {
        let cfg = StoreConfig::default()
            .with_collection_path("applications")
            .with_skeleton_min_duration(Duration::from_millis(250));
        assert_eq!(cfg.collection_path, "applications");
        assert_eq!(cfg.skeleton_min_duration, Duration::from_millis(250));
    }
}
