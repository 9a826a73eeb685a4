use std::time::Duration;

/// `spec.md` §6 "Configuration". Loaded by `cmd/node`'s CLI layer and
/// handed to the engine at construction time; the engine itself never
/// reads configuration from anywhere else.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub block_headers_per_request: u64,
    pub block_bodies_per_request: u64,
    pub block_resolve_depth: u64,
    pub sync_request_timeout: Duration,
    pub check_for_new_block_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            block_headers_per_request: 192,
            block_bodies_per_request: 128,
            block_resolve_depth: 64,
            sync_request_timeout: Duration::from_secs(8),
            check_for_new_block_interval: Duration::from_secs(10),
        }
    }
}
