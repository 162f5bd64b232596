//! Run configuration and per-run context.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};

use pulse_core::defaults;
use pulse_inference::{BackendSelector, BrandContext};
use pulse_search::SearchConfig;

use crate::checkpoint::CheckpointStore;
use crate::engine::EngineConfig;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory holding raw inputs, outputs, checkpoint and lock.
    pub data_dir: PathBuf,
    pub batch_size: usize,
    pub inter_batch_delay_ms: u64,
    pub brand_name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(defaults::DATA_DIR),
            batch_size: defaults::BATCH_SIZE,
            inter_batch_delay_ms: defaults::INTER_BATCH_DELAY_MS,
            brand_name: defaults::BRAND_NAME.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `PULSE_DATA_DIR` | `./data` | Input/output directory |
    /// | `PULSE_BATCH_SIZE` | `5` | Records per classification call |
    /// | `PULSE_INTER_BATCH_DELAY_MS` | `500` | Pause between batch calls |
    /// | `PULSE_BRAND_NAME` | `Matiks` | Brand being monitored |
    pub fn from_env() -> Self {
        let base = Self::default();

        let data_dir = std::env::var("PULSE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(base.data_dir);

        let batch_size = std::env::var("PULSE_BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(base.batch_size)
            .max(1);

        let inter_batch_delay_ms = std::env::var("PULSE_INTER_BATCH_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(base.inter_batch_delay_ms);

        let brand_name = std::env::var("PULSE_BRAND_NAME")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(base.brand_name);

        Self {
            data_dir,
            batch_size,
            inter_batch_delay_ms,
            brand_name,
        }
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_inter_batch_delay_ms(mut self, ms: u64) -> Self {
        self.inter_batch_delay_ms = ms;
        self
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_batch_size(self.batch_size)
            .with_inter_batch_delay(Duration::from_millis(self.inter_batch_delay_ms))
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig::for_brand(&self.brand_name)
    }

    pub fn brand_context(&self) -> BrandContext {
        BrandContext::for_brand(&self.brand_name)
    }
}

/// State of a single run, passed explicitly to every stage.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub config: PipelineConfig,
    pub selector: BackendSelector,
    /// Clock reading used for timestamps and the digest schedule.
    pub now: DateTime<Utc>,
}

impl RunContext {
    pub fn new(config: PipelineConfig, selector: BackendSelector) -> Self {
        Self {
            config,
            selector,
            now: Utc::now(),
        }
    }

    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.config.data_dir.join(file_name)
    }

    pub fn checkpoints(&self) -> CheckpointStore {
        CheckpointStore::in_dir(&self.config.data_dir)
    }
}
