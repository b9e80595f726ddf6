//! VoxCanvas Demo
//!
//! Runs prompts through the moderated text-to-image pipeline against mock
//! providers and prints what the user would see.

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use voxcanvas_classifiers::TextModerator;
use voxcanvas_core::Prompt;
use voxcanvas_demo::cli::{Cli, Commands};
use voxcanvas_demo::config::DemoConfig;
use voxcanvas_demo::mock::KeywordClassifier;
use voxcanvas_demo::{build_session, report};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            prompts,
            config,
            hide_adult,
            audit,
            metrics,
            overrides,
            verbose,
        } => {
            init_tracing(verbose, cli.json_logs);
            let metrics_handle = init_metrics()?;
            let config = DemoConfig::load(config.as_deref(), &overrides)?;
            run(prompts, &config, hide_adult, audit, metrics.then_some(metrics_handle)).await?;
        }

        Commands::Check {
            prompt,
            config,
            overrides,
            verbose,
        } => {
            init_tracing(verbose, cli.json_logs);
            let config = DemoConfig::load(config.as_deref(), &overrides)?;
            check(&prompt, &config).await?;
        }

        Commands::DefaultConfig => {
            print!("{}", serde_yaml::to_string(&DemoConfig::default())?);
        }
    }

    Ok(())
}

async fn run(
    prompts: Vec<String>,
    config: &DemoConfig,
    hide_adult: bool,
    audit: bool,
    metrics: Option<PrometheusHandle>,
) -> Result<()> {
    let session = build_session(config)?;
    info!(prompts = prompts.len(), "Session started");

    // Ctrl-C ends the session; an in-flight run is abandoned
    let token = session.cancellation_token();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, ending session");
            token.cancel();
        }
    });

    for text in prompts {
        let prompt = match Prompt::new(text.as_str()) {
            Ok(prompt) => prompt,
            Err(e) => {
                println!("✗ \"{}\": {}", text, e);
                continue;
            }
        };
        report::print_advice(&prompt.validate());

        match session.run(prompt).await {
            Ok(outcome) => report::print_outcome(&text, &outcome),
            Err(e) => {
                println!("✗ \"{}\": {}", text, e);
                if session.is_ended() {
                    break;
                }
            }
        }
    }

    report::print_gallery(&session.list(hide_adult));

    if audit {
        let events = session.with_audit(|trail| {
            if !trail.verify() {
                warn!("Audit trail failed verification");
            }
            serde_json::to_string_pretty(trail.events())
        })?;
        println!("{}", events);
    }

    if let Some(handle) = metrics {
        println!("{}", handle.render());
    }

    let snapshot = session.metrics();
    info!(
        runs = snapshot.total_runs,
        finalized = snapshot.finalized,
        rejected = snapshot.rejected(),
        avg_latency_us = snapshot.avg_latency_us(),
        "Session summary"
    );

    session.end();
    Ok(())
}

async fn check(text: &str, config: &DemoConfig) -> Result<()> {
    let prompt = Prompt::new(text)?;
    report::print_advice(&prompt.validate());

    let classifier = Arc::new(KeywordClassifier::new(config.mock.text_classifier_available));
    let moderator = TextModerator::new(classifier, &config.moderation)?;
    let assessment = moderator
        .evaluate(&prompt, config.pipeline.classifier_timeout())
        .await;

    let verdict = &assessment.verdict;
    println!(
        "{} rating={} ({}) source={} confidence={:.2}",
        if verdict.flagged { "BLOCKED" } else { "allowed" },
        verdict.category,
        verdict.category.age_label(),
        assessment.source.as_str(),
        verdict.confidence()
    );
    for reason in &verdict.reasons {
        println!("  - {}", reason);
    }
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("voxcanvas=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("voxcanvas=info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Initialize metrics recorder and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!("voxcanvas_runs_total", "Pipeline runs by terminal outcome");
    metrics::describe_counter!(
        "voxcanvas_generation_attempts_total",
        "Calls made to the image generator"
    );
    metrics::describe_counter!(
        "voxcanvas_fallbacks_total",
        "Classifier calls answered by the conservative fallback, by stage"
    );
    metrics::describe_counter!(
        "voxcanvas_overrides_total",
        "Prompts blocked by the high-severity term list"
    );
    metrics::describe_histogram!(
        "voxcanvas_run_latency_us",
        metrics::Unit::Microseconds,
        "End-to-end run latency in microseconds"
    );

    Ok(handle)
}
