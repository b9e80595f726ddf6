//! Session lifecycle: reentrancy, cancellation and teardown

mod common;

use common::*;
use async_trait::async_trait;
use std::sync::{Arc, OnceLock, Weak};
use voxcanvas_classifiers::{
    ImageClassifier, ImageRater, ModerationConfig, SeverityReport, TextModerator,
};
use voxcanvas_core::{Error, ImageHandle, Prompt, RatingCategory, Result};
use voxcanvas_pipeline::{Pipeline, PipelineConfig, Session};
use voxcanvas_telemetry::AuditKind;

/// Image classifier that ends its own session before answering
#[derive(Default)]
struct EndsSessionClassifier {
    session: OnceLock<Weak<Session>>,
}

#[async_trait]
impl ImageClassifier for EndsSessionClassifier {
    async fn classify_image(
        &self,
        _image: &ImageHandle,
        _prompt: &Prompt,
    ) -> Result<SeverityReport> {
        if let Some(session) = self.session.get().and_then(Weak::upgrade) {
            session.end();
        }
        Ok(SeverityReport::new(0.0))
    }

    fn name(&self) -> &str {
        "ends-session"
    }
}

#[tokio::test]
async fn test_concurrent_run_is_refused() {
    let gate = Gate::default();
    let session = Arc::new(Session::new(pipeline(
        MockClassifier::clean(),
        MockClassifier::clean(),
        MockGenerator::gated(gate.clone()),
    )));

    let first = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.run(prompt("a friendly cartoon dog")).await }
    });
    gate.started.notified().await;

    let second = session.run(prompt("a red bicycle")).await;
    assert!(matches!(second, Err(Error::RunInProgress)));

    gate.release.notify_one();
    let outcome = first.await.unwrap().unwrap();
    assert!(outcome.is_finalized());
    assert_eq!(session.gallery().len(), 1);
    assert_eq!(session.metrics().total_runs, 1);
}

#[tokio::test]
async fn test_ending_session_abandons_run_without_append() {
    let gate = Gate::default();
    let generator = MockGenerator::gated(gate.clone());
    let session = Arc::new(Session::new(pipeline(
        MockClassifier::clean(),
        MockClassifier::clean(),
        generator.clone(),
    )));

    let run = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.run(prompt("a friendly cartoon dog")).await }
    });
    gate.started.notified().await;

    session.end();
    assert!(matches!(run.await.unwrap(), Err(Error::Cancelled)));
    assert!(session.gallery().is_empty());
    assert!(session.is_ended());

    // Releasing the generator afterwards changes nothing
    gate.release.notify_one();
    tokio::task::yield_now().await;
    assert!(session.gallery().is_empty());

    session.with_audit(|trail| {
        assert!(trail.verify());
        assert!(trail.events().iter().any(|e| e.kind == AuditKind::RunAbandoned));
        assert!(trail.events().iter().all(|e| e.kind != AuditKind::RunFinalized));
    });
}

#[tokio::test]
async fn test_ended_session_refuses_new_runs() {
    let session = Session::new(pipeline(
        MockClassifier::clean(),
        MockClassifier::clean(),
        MockGenerator::succeeding(),
    ));
    session.run(prompt("a friendly cartoon dog")).await.unwrap();
    assert_eq!(session.gallery().len(), 1);

    session.end();
    assert!(session.gallery().is_empty());
    assert!(matches!(session.run(prompt("a red bicycle")).await, Err(Error::Cancelled)));
    assert!(matches!(session.transcribe(&clip("wav")).await, Err(Error::Cancelled)));

    session.with_audit(|trail| {
        assert_eq!(trail.events().last().map(|e| e.kind), Some(AuditKind::GalleryCleared));
    });
}

#[tokio::test]
async fn test_transcribe_then_edit_then_run() {
    let pipeline = pipeline(
        MockClassifier::clean(),
        MockClassifier::clean(),
        MockGenerator::succeeding(),
    )
    .with_transcriber(MockTranscriber::hearing("a friendly cartoon dock"));
    let session = Session::new(pipeline);

    let heard = session.transcribe(&clip("m4a")).await.unwrap();
    let edited = heard.edit("a friendly cartoon dog").unwrap();
    assert!(edited.is_edited());

    let outcome = session.run(edited).await.unwrap();
    let entry = outcome.entry().unwrap();
    assert_eq!(entry.prompt().text(), "a friendly cartoon dog");
    assert_eq!(entry.prompt().transcript(), Some("a friendly cartoon dock"));
}

#[tokio::test]
async fn test_hide_adult_toggle_is_reversible() {
    let session = Session::new(pipeline(
        MockClassifier::clean(),
        MockClassifier::clean(),
        MockGenerator::succeeding(),
    ));

    session.run(prompt("a calm lake")).await.unwrap();
    session.run(prompt("an explicit figure study")).await.unwrap();

    let counts = session.gallery().counts();
    assert_eq!(counts.get(&RatingCategory::Adult), Some(&1));

    assert_eq!(session.list(true).len(), 1);
    assert_eq!(session.list(false).len(), 2);
    assert_eq!(session.list(true).len(), 1);
    assert_eq!(session.gallery().len(), 2);
}

#[tokio::test]
async fn test_session_ended_during_image_check_leaves_gallery_empty() {
    let classifier = Arc::new(EndsSessionClassifier::default());
    let moderation = ModerationConfig::default();
    let pipeline = Pipeline::new(
        TextModerator::new(MockClassifier::clean(), &moderation).unwrap(),
        ImageRater::new(classifier.clone(), &moderation).unwrap(),
        MockGenerator::succeeding(),
        PipelineConfig::default(),
    );
    let session = Arc::new(Session::new(pipeline));
    classifier.session.set(Arc::downgrade(&session)).unwrap();

    let result = session.run(prompt("a friendly cartoon dog")).await;

    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(session.is_ended());
    assert!(session.gallery().is_empty());
    assert!(session.list(false).is_empty());
    session.with_audit(|trail| {
        let kinds: Vec<_> = trail.events().iter().map(|e| e.kind).collect();
        assert!(kinds.contains(&AuditKind::RunAbandoned));
        assert!(!kinds.contains(&AuditKind::RunFinalized));
    });
}
