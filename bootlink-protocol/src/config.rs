//! Link configuration

use crate::frame::{PingResponse, PING_RESPONSE};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default per-byte read timeout inside a frame (ms)
pub const DEFAULT_BYTE_TIMEOUT_MS: u32 = 10;

/// Tunables for a [`SerialLink`](crate::SerialLink)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkConfig {
    /// Time allowed per byte once a frame has started; 0 waits forever
    pub byte_timeout_ms: u32,
    /// Pause before a data frame that directly follows a sync write, giving
    /// the host time to get back into its receive routine
    pub back_to_back_delay_ms: u32,
    /// Record returned to a PING
    pub ping_response: PingResponse,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            byte_timeout_ms: DEFAULT_BYTE_TIMEOUT_MS,
            back_to_back_delay_ms: 0,
            ping_response: PING_RESPONSE,
        }
    }
}

impl LinkConfig {
    /// Timeout for reading `count` bytes of an in-progress frame
    ///
    /// Scales with the byte count. `None` means the read is unbounded.
    pub fn timeout_for(&self, count: usize) -> Option<u32> {
        match self.byte_timeout_ms {
            0 => None,
            per_byte => {
                let count = u32::try_from(count).unwrap_or(u32::MAX);
                Some(per_byte.saturating_mul(count))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LinkConfig::default();
        assert_eq!(config.byte_timeout_ms, 10);
        assert_eq!(config.back_to_back_delay_ms, 0);
        assert_eq!(config.ping_response, PING_RESPONSE);
    }

    #[test]
    fn test_timeout_scales_with_count() {
        let config = LinkConfig::default();
        assert_eq!(config.timeout_for(1), Some(10));
        assert_eq!(config.timeout_for(2), Some(20));
        assert_eq!(config.timeout_for(256), Some(2560));
    }

    #[test]
    fn test_zero_disables_timeout() {
        let config = LinkConfig {
            byte_timeout_ms: 0,
            ..LinkConfig::default()
        };
        assert_eq!(config.timeout_for(4), None);
    }

    #[test]
    fn test_timeout_saturates() {
        let config = LinkConfig {
            byte_timeout_ms: u32::MAX / 2,
            ..LinkConfig::default()
        };
        assert_eq!(config.timeout_for(3), Some(u32::MAX));
    }
}
