//! Wall-clock helper for binaries. The engine itself never reads a clock:
//! every entry point takes an explicit timestamp, which is what keeps
//! rollover deterministic and replayable.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current UTC time as Unix seconds.
pub fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_is_recent() {
        // 2026-01-01T00:00:00Z
        assert!(now_unix_secs() > 1_767_225_600);
    }
}
