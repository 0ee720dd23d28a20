//! Configuration for arraystore
//!
//! Centralized configuration with sensible defaults.

/// Configuration for a Store session
#[derive(Debug, Clone)]
pub struct StoreConfig {
    // -------------------------------------------------------------------------
    // Durability
    // -------------------------------------------------------------------------
    /// When committed datasets are forced to stable storage
    pub sync_strategy: SyncStrategy,

    // -------------------------------------------------------------------------
    // Integrity
    // -------------------------------------------------------------------------
    /// Verify the body CRC32 of every record when it is read back. Prefix
    /// and descriptor checksums are always checked.
    pub verify_checksums: bool,
}

/// Sync strategy for write sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// Hand each dataset to the OS on write, fsync once on close
    Flush,

    /// fsync after every committed dataset (safest, slowest)
    EveryWrite,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sync_strategy: SyncStrategy::Flush,
            verify_checksums: true,
        }
    }
}

impl StoreConfig {
    /// Create a new config builder
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }
}

/// Builder for StoreConfig
#[derive(Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Enable or disable checksum verification on read
    pub fn verify_checksums(mut self, verify: bool) -> Self {
        self.config.verify_checksums = verify;
        self
    }

    pub fn build(self) -> StoreConfig {
        self.config
    }
}
