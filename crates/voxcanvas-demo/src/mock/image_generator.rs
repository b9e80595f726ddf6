use async_trait::async_trait;
use rand::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use voxcanvas_core::ImageHandle;
use voxcanvas_pipeline::{GenerationError, ImageGenerator};

/// PNG signature followed by a placeholder body
const PLACEHOLDER_PNG: &[u8] = &[0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a];

/// Generator that returns a placeholder image after a random delay.
///
/// The first `transient_failures` calls fail with a network error so the
/// retry path can be seen in action.
pub struct MockImageGenerator {
    remaining_failures: AtomicU32,
    max_latency_ms: u64,
}

impl MockImageGenerator {
    pub fn new(transient_failures: u32, max_latency_ms: u64) -> Self {
        Self {
            remaining_failures: AtomicU32::new(transient_failures),
            max_latency_ms,
        }
    }
}

#[async_trait]
impl ImageGenerator for MockImageGenerator {
    async fn generate(&self, prompt: &str) -> Result<ImageHandle, GenerationError> {
        if self.max_latency_ms > 0 {
            let delay = rand::thread_rng().gen_range(0..=self.max_latency_ms);
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let failing = self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(GenerationError::Network("simulated connection reset".to_string()));
        }

        Ok(ImageHandle::new(PLACEHOLDER_PNG.to_vec(), "image/png")
            .with_source_url("mock://images/placeholder.png")
            .with_revised_prompt(prompt))
    }

    fn name(&self) -> &str {
        "mock-image-generator"
    }
}
