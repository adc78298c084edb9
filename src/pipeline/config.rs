use serde::Serialize;
use std::env;
use std::path::PathBuf;
use std::thread;

/// Environment variable naming the application-bundled tool directory
pub const RESOURCE_DIR_ENV: &str = "CAMTELEMETRY_RESOURCE_DIR";

/// Tunables for one extraction run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractorConfig {
    /// Bytes read per step of the full-file scan
    pub scan_chunk_size: usize,
    /// Bytes at the end of each scan chunk left for the next one, so a KLV
    /// header is never split across reads
    pub scan_tail_reserve: usize,
    /// Try the external prober/extractor when no telemetry track is found
    pub use_external_tools: bool,
    /// How many of the best-scoring streams the extractor is run on
    pub max_external_streams: usize,
    /// Concurrent extractions in the worker pool
    pub worker_count: usize,
    /// Application-bundled tool directory
    pub resource_dir: Option<PathBuf>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        ExtractorConfig {
            scan_chunk_size: 8 * 1024 * 1024,
            scan_tail_reserve: 32 * 1024,
            use_external_tools: true,
            max_external_streams: 3,
            worker_count: default_worker_count(),
            resource_dir: None,
        }
    }
}

impl ExtractorConfig {
    /// Configured resource directory, else the one named by the environment
    pub fn resolved_resource_dir(&self) -> Option<PathBuf> {
        self.resource_dir.clone().or_else(|| {
            env::var_os(RESOURCE_DIR_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        })
    }

    pub fn with_worker_count(mut self, workers: usize) -> Self {
        self.worker_count = workers.max(1);
        self
    }

    pub fn without_external_tools(mut self) -> Self {
        self.use_external_tools = false;
        self
    }
}

/// Half the available cores, between 1 and 2
pub fn default_worker_count() -> usize {
    let cores = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (cores / 2).clamp(1, 2)
}
