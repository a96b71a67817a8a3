//! Indexer configuration and fluent builder.

use serde::{Deserialize, Serialize};

/// Configuration for one indexer instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Unique name for this indexer (cursor key, log field).
    pub id: String,
    /// Chain slug, e.g. `"starknet"`.
    pub chain: String,
    /// Block to start from when no cursor is persisted yet.
    #[serde(default)]
    pub starting_block: u64,
    /// Maximum consecutive reconnect attempts before giving up.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Initial reconnect backoff in milliseconds (doubles per attempt).
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_max_retries() -> u32 {
    5
}

fn default_backoff_ms() -> u64 {
    500
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            id: "default".into(),
            chain: "starknet".into(),
            starting_block: 0,
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

/// Fluent builder for `IndexerConfig`.
///
/// # Example
///
/// ```rust
/// use agoraindex_core::config::IndexerBuilder;
///
/// let config = IndexerBuilder::new()
///     .id("topics")
///     .starting_block(640_000)
///     .max_retries(8)
///     .build_config();
/// assert_eq!(config.id, "topics");
/// ```
#[derive(Default)]
pub struct IndexerBuilder {
    config: IndexerConfig,
}

impl IndexerBuilder {
    pub fn new() -> Self {
        Self {
            config: IndexerConfig::default(),
        }
    }

    /// Set the indexer id (used for cursor keys).
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.config.id = id.into();
        self
    }

    /// Set the chain slug.
    pub fn chain(mut self, chain: impl Into<String>) -> Self {
        self.config.chain = chain.into();
        self
    }

    /// Set the block to start from on first run.
    pub fn starting_block(mut self, block: u64) -> Self {
        self.config.starting_block = block;
        self
    }

    /// Set the reconnect attempt limit.
    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    /// Set the initial reconnect backoff in milliseconds.
    pub fn backoff_ms(mut self, ms: u64) -> Self {
        self.config.backoff_ms = ms;
        self
    }

    pub fn build_config(self) -> IndexerConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let cfg = IndexerBuilder::new().build_config();
        assert_eq!(cfg.chain, "starknet");
        assert_eq!(cfg.max_retries, 5);
        assert_eq!(cfg.backoff_ms, 500);
    }

    #[test]
    fn builder_custom() {
        let cfg = IndexerBuilder::new()
            .id("topics")
            .chain("starknet-sepolia")
            .starting_block(640_000)
            .max_retries(3)
            .backoff_ms(250)
            .build_config();

        assert_eq!(cfg.id, "topics");
        assert_eq!(cfg.chain, "starknet-sepolia");
        assert_eq!(cfg.starting_block, 640_000);
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.backoff_ms, 250);
    }
}
