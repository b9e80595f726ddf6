//! In-process stand-ins for the external providers

mod image_generator;
mod keyword_classifier;

pub use image_generator::MockImageGenerator;
pub use keyword_classifier::KeywordClassifier;
