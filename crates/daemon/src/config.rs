//! Daemon configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use testmend_common::queue::{MAX_RETENTION_DAYS, MIN_RETENTION_DAYS};
use testmend_common::HealingConfig;

/// Daemon configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Store directory path
    pub store_path: PathBuf,

    /// Analysis tunables shared with the library
    pub healing: HealingConfig,

    /// Worker pool configuration
    pub workers: WorkerConfig,

    /// Retention sweeper configuration
    pub retention: RetentionConfig,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            store_path: testmend_common::default_store_path(),
            healing: HealingConfig::default(),
            workers: WorkerConfig::default(),
            retention: RetentionConfig::default(),
        }
    }
}

/// Worker pool configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Concurrent analysis workers
    pub count: usize,

    /// Idle wait between queue polls
    pub poll_interval_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            count: 2,
            poll_interval_ms: 1000,
        }
    }
}

/// Retention configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Run the periodic sweep
    pub enabled: bool,

    /// Terminal records older than this are deleted
    pub older_than_days: u32,

    /// Time between sweeps
    pub sweep_interval_secs: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            older_than_days: 30,
            sweep_interval_secs: 3600,
        }
    }
}

impl DaemonConfig {
    /// Load configuration from file
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the daemon cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        self.healing.validate()?;
        if self.workers.count == 0 {
            anyhow::bail!("workers.count must be at least 1");
        }
        if self.workers.poll_interval_ms == 0 {
            anyhow::bail!("workers.poll_interval_ms must be at least 1");
        }
        if !(MIN_RETENTION_DAYS..=MAX_RETENTION_DAYS).contains(&self.retention.older_than_days) {
            anyhow::bail!(
                "retention.older_than_days must be between {} and {} (got {})",
                MIN_RETENTION_DAYS,
                MAX_RETENTION_DAYS,
                self.retention.older_than_days
            );
        }
        if self.retention.enabled && self.retention.sweep_interval_secs == 0 {
            anyhow::bail!("retention.sweep_interval_secs must be at least 1");
        }
        Ok(())
    }

    /// Get the database path
    pub fn db_path(&self) -> PathBuf {
        self.store_path.join("state.db")
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.workers.poll_interval_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.retention.sweep_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DaemonConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, DaemonConfig::default());
        config.validate().unwrap();
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = DaemonConfig::default();
        config.store_path = dir.path().join("store");
        config.workers.count = 4;
        config.healing.confidence_floor = 0.7;
        config.retention.older_than_days = 14;
        config.save(&path).unwrap();

        assert_eq!(DaemonConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[workers]\ncount = 8\n\n[healing]\nconfidence_floor = 0.6\n").unwrap();

        let config = DaemonConfig::load(&path).unwrap();
        assert_eq!(config.workers.count, 8);
        assert_eq!(config.workers.poll_interval_ms, 1000);
        assert_eq!(config.healing.confidence_floor, 0.6);
        assert_eq!(config.healing.max_candidates, 5);
        assert!(config.retention.enabled);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut config = DaemonConfig::default();
        config.workers.count = 0;
        assert!(config.validate().is_err());

        let mut config = DaemonConfig::default();
        config.retention.older_than_days = 400;
        assert!(config.validate().is_err());

        let mut config = DaemonConfig::default();
        config.healing.confidence_floor = 1.5;
        assert!(config.validate().is_err());
    }
}
