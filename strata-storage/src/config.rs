//! Block store configuration.

use std::path::PathBuf;

use serde::Deserialize;

/// Who writes index entries when a block is stored or removed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexMode {
    /// The block store indexes blocks only.
    #[default]
    BlockOnly,
    /// The block store indexes blocks and their actions in one commit.
    BlockAndActions,
    /// An external index builder does all indexing.
    External,
}

/// Block store settings.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Path of the primary store; shard files are created next to it.
    pub db_path: PathBuf,
    /// Attempts per write before an I/O error is surfaced.
    pub num_retries: u8,
    /// Capacity of each header/body/footer cache; 0 disables caching.
    pub max_cache_size: usize,
    /// Shard rollover size in bytes; 0 disables sharding.
    pub split_db_size_bytes: u64,
    /// Blocks at or below this height always live in the primary store.
    pub split_db_height: u64,
    /// Compress header, body and footer with zstd.
    pub compress_block: bool,
    /// Indexing responsibility.
    pub index_mode: IndexMode,
}

impl Default for DbConfig {
    fn default() -> Self {
        DbConfig {
            db_path: PathBuf::from("chain.db"),
            num_retries: 3,
            max_cache_size: 64,
            split_db_size_bytes: 0,
            split_db_height: 900_000,
            compress_block: false,
            index_mode: IndexMode::BlockOnly,
        }
    }
}

impl DbConfig {
    /// Whether a block at `height` is stored in a numbered shard rather than the primary store.
    pub fn is_sharded(&self, height: u64) -> bool {
        self.split_db_size_bytes > 0 && height > self.split_db_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sharding_disabled_by_zero_size() {
        let config = DbConfig {
            split_db_size_bytes: 0,
            split_db_height: 0,
            ..DbConfig::default()
        };
        assert!(!config.is_sharded(1_000));
    }

    #[test]
    fn test_height_threshold_is_inclusive_for_primary() {
        let config = DbConfig {
            split_db_size_bytes: 1024,
            split_db_height: 10,
            ..DbConfig::default()
        };
        assert!(!config.is_sharded(10));
        assert!(config.is_sharded(11));
    }
}
