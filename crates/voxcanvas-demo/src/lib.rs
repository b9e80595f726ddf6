//! VoxCanvas Demo
//!
//! Wires the pipeline to in-process mock providers so the moderation flow
//! can be exercised from a terminal without any external service.

pub mod cli;
pub mod config;
pub mod mock;
pub mod report;

use config::DemoConfig;
use mock::{KeywordClassifier, MockImageGenerator};
use std::sync::Arc;
use voxcanvas_classifiers::{ImageRater, TextModerator};
use voxcanvas_pipeline::{Pipeline, Session};

/// Build a session backed by the mock providers described in `config`
pub fn build_session(config: &DemoConfig) -> voxcanvas_core::Result<Session> {
    let text = Arc::new(KeywordClassifier::new(config.mock.text_classifier_available));
    let image = Arc::new(KeywordClassifier::new(config.mock.image_classifier_available));
    let generator = Arc::new(MockImageGenerator::new(
        config.mock.transient_failures,
        config.mock.max_latency_ms,
    ));

    let pipeline = Pipeline::new(
        TextModerator::new(text, &config.moderation)?,
        ImageRater::new(image, &config.moderation)?,
        generator,
        config.pipeline,
    );

    Ok(Session::new(pipeline))
}
