use std::time::Duration;

use tracing::debug;

/// Fixed delay between sequential upstream calls. Only one request is ever in
/// flight, so spacing consecutive calls is all the rate limiting needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    delay: Duration,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Whether a pause follows item `index` (0-based) of a batch of `total`.
    /// The final item is never followed by a pause.
    pub fn pauses_after(index: usize, total: usize) -> bool {
        index + 1 < total
    }

    pub async fn after(&self, index: usize, total: usize) {
        if self.delay.is_zero() || !Self::pauses_after(index, total) {
            return;
        }
        debug!(delay_ms = self.delay.as_millis() as u64, "pace: sleeping to respect rate limits");
        tokio::time::sleep(self.delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn no_pause_after_last_item() {
        assert!(Pacer::pauses_after(0, 3));
        assert!(Pacer::pauses_after(1, 3));
        assert!(!Pacer::pauses_after(2, 3));
        assert!(!Pacer::pauses_after(0, 1));
        assert!(!Pacer::pauses_after(0, 0));
    }

    #[tokio::test]
    async fn sleeps_between_items_only() {
        let pacer = Pacer::new(Duration::from_millis(40));
        let start = Instant::now();
        pacer.after(2, 3).await;
        assert!(start.elapsed() < Duration::from_millis(40));
        pacer.after(0, 3).await;
        assert!(start.elapsed() >= Duration::from_millis(40));
    }
}
