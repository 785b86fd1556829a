use {
    crate::Error,
    serde::{Deserialize, Serialize},
};

/// Replication factor used when a configuration leaves it out.
pub const DEFAULT_REPLICATION_FACTOR: usize = 100;

/// Construction parameters of a `Ring`, loadable from any serde format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RingConfig {
    /// Number of positions placed on the ring per target.
    pub replication_factor: usize,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            replication_factor: DEFAULT_REPLICATION_FACTOR,
        }
    }
}

impl RingConfig {
    pub fn new(replication_factor: usize) -> Self {
        Self { replication_factor }
    }

    /// Returns an error if the configuration cannot produce a ring.
    pub fn validate(&self) -> Result<(), Error> {
        if self.replication_factor == 0 {
            return Err(Error::InvalidConfiguration(
                "replication factor must be at least 1".into(),
            ));
        }

        Ok(())
    }
}
