//! Notification id generation.

use railbook_core::environment::{Clock, IdGenerator};
use rand::Rng;
use std::sync::Arc;

/// Ids of the form `<unix-millis>-<8 hex digits>`
///
/// The random suffix separates ids minted in the same millisecond. Uniqueness
/// is best-effort.
#[derive(Clone)]
pub struct TimestampIdGenerator {
    clock: Arc<dyn Clock>,
}

impl TimestampIdGenerator {
    /// Mint ids from `clock`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl std::fmt::Debug for TimestampIdGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimestampIdGenerator").finish_non_exhaustive()
    }
}

impl IdGenerator for TimestampIdGenerator {
    fn next_id(&self) -> String {
        let millis = self.clock.now().timestamp_millis();
        let suffix: u32 = rand::thread_rng().r#gen();
        format!("{millis}-{suffix:08x}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use railbook_testing::test_clock;

    #[test]
    fn test_id_shape() {
        let ids = TimestampIdGenerator::new(Arc::new(test_clock()));
        let id = ids.next_id();

        let (millis, suffix) = id.split_once('-').unwrap_or_else(|| unreachable!("id has a dash"));
        assert_eq!(millis, "1735689600000");
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_same_millisecond_ids_differ() {
        let ids = TimestampIdGenerator::new(Arc::new(test_clock()));
        let generated: std::collections::HashSet<String> = (0..64).map(|_| ids.next_id()).collect();
        // 64 draws from 2^32 collide with negligible probability
        assert_eq!(generated.len(), 64);
    }
}
