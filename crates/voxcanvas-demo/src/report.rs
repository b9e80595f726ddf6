//! Terminal rendering of run outcomes and the gallery

use voxcanvas_core::{GalleryEntry, PromptAdvice};
use voxcanvas_pipeline::{GalleryListing, RunOutcome};

pub fn print_advice(advice: &PromptAdvice) {
    for issue in &advice.issues {
        println!("  ! {}", issue);
    }
    for recommendation in &advice.recommendations {
        println!("  > {}", recommendation);
    }
}

pub fn print_outcome(prompt: &str, outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Finalized(entry) => {
            println!("✓ \"{}\"", prompt);
            print_entry(entry);
        }
        RunOutcome::Rejected(rejection) => {
            println!("✗ \"{}\" rejected at {}", prompt, rejection.stage.as_str());
            for reason in &rejection.reasons {
                println!("    - {}", reason);
            }
        }
    }
}

fn print_entry(entry: &GalleryEntry) {
    let rating = entry.rating();
    println!(
        "    rating: {} ({}), {}",
        rating,
        rating.age_label(),
        rating.description()
    );
    if let Some(warning) = entry.content_warning() {
        println!("    ⚠ {}", warning);
    }
    for warning in entry.warnings() {
        println!("    - {}", warning);
    }
}

pub fn print_gallery(listing: &GalleryListing) {
    println!();
    println!(
        "Gallery: {} shown, {} hidden",
        listing.len(),
        listing.hidden()
    );
    for entry in listing.iter_newest_first() {
        let id = entry
            .id()
            .map(|id| id.to_string())
            .unwrap_or_default();
        println!(
            "  [{}] {} \"{}\" at {}",
            entry.rating().age_label(),
            id,
            entry.prompt().text(),
            entry.created_at().format("%H:%M:%S")
        );
    }
}
