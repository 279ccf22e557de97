use crate::config::UiConfig;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Paces how groups of items (cards, track rows) appear.
#[async_trait]
pub trait AnimationDriver: Send + Sync {
    /// Wait before showing item `index` of a group.
    async fn before_item(&self, index: usize);

    fn name(&self) -> &'static str;
}

/// Shows everything at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAnimations;

#[async_trait]
impl AnimationDriver for NoopAnimations {
    async fn before_item(&self, _index: usize) {}

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Reveals items one after another with a fixed delay.
#[derive(Debug, Clone, Copy)]
pub struct StaggeredAnimations {
    stagger: Duration,
}

impl StaggeredAnimations {
    #[must_use]
    pub const fn new(stagger: Duration) -> Self {
        Self { stagger }
    }
}

#[async_trait]
impl AnimationDriver for StaggeredAnimations {
    async fn before_item(&self, index: usize) {
        if index > 0 && !self.stagger.is_zero() {
            tokio::time::sleep(self.stagger).await;
        }
    }

    fn name(&self) -> &'static str {
        "staggered"
    }
}

/// Pick the driver once at startup.
#[must_use]
pub fn animation_driver(config: &UiConfig) -> Arc<dyn AnimationDriver> {
    if config.animations {
        Arc::new(StaggeredAnimations::new(Duration::from_millis(config.stagger_ms)))
    } else {
        Arc::new(NoopAnimations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_stagger_waits_between_items() {
        let driver = animation_driver(&UiConfig::default());
        assert_eq!(driver.name(), "staggered");

        let start = Instant::now();
        for i in 0..3 {
            driver.before_item(i).await;
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_animations() {
        let config = UiConfig {
            animations: false,
            stagger_ms: 100,
        };
        let driver = animation_driver(&config);
        assert_eq!(driver.name(), "none");

        let start = Instant::now();
        driver.before_item(5).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
