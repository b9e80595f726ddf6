//! Core types for VoxCanvas

use crate::error::Error;
use crate::prompt::Prompt;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Ordered maturity bucket assigned to prompts and images.
///
/// The declaration order is the rating order: `General < Teen < Mature < Adult`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum RatingCategory {
    /// Suitable for all ages
    #[default]
    General,
    /// Ages 13 and up
    Teen,
    /// Ages 17 and up
    Mature,
    /// Ages 18 and up only
    Adult,
}

impl RatingCategory {
    /// All categories in ascending order
    pub const ALL: [RatingCategory; 4] = [Self::General, Self::Teen, Self::Mature, Self::Adult];

    /// Lowercase identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Teen => "teen",
            Self::Mature => "mature",
            Self::Adult => "adult",
        }
    }

    /// Human-readable audience description
    pub fn description(&self) -> &'static str {
        match self {
            Self::General => "Suitable for all ages",
            Self::Teen => "Suitable for ages 13 and up",
            Self::Mature => "Suitable for ages 17 and up",
            Self::Adult => "Suitable for ages 18 and up only",
        }
    }

    /// Short age label for badges
    pub fn age_label(&self) -> &'static str {
        match self {
            Self::General => "All ages",
            Self::Teen => "13+",
            Self::Mature => "17+",
            Self::Adult => "18+",
        }
    }

    /// Whether results with this rating are shown behind a content warning
    pub fn requires_warning(&self) -> bool {
        *self >= Self::Mature
    }
}

impl fmt::Display for RatingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RatingCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(Self::General),
            "teen" => Ok(Self::Teen),
            "mature" => Ok(Self::Mature),
            "adult" => Ok(Self::Adult),
            other => Err(Error::config(format!("unknown rating category: {}", other))),
        }
    }
}

/// Structured judgment produced by a moderation stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationVerdict {
    /// Content violates acceptable-use policy outright
    pub flagged: bool,

    /// Maturity rating
    pub category: RatingCategory,

    /// Human-readable reasons, in the order they were found
    pub reasons: Vec<String>,

    /// Confidence score, kept within 0.0-1.0 on every path including deserialization
    #[serde(deserialize_with = "deserialize_confidence")]
    confidence: f32,
}

impl ModerationVerdict {
    /// Create an unflagged verdict
    pub fn rated(category: RatingCategory, confidence: f32) -> Self {
        Self {
            flagged: false,
            category,
            reasons: Vec::new(),
            confidence: clamp_confidence(confidence),
        }
    }

    /// Create a verdict for policy-violating content
    pub fn flagged(reasons: Vec<String>, confidence: f32) -> Self {
        Self {
            flagged: true,
            category: RatingCategory::Adult,
            reasons,
            confidence: clamp_confidence(confidence),
        }
    }

    /// Confidence score (0.0-1.0)
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Append a reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reasons.push(reason.into());
        self
    }

    /// Raise the category to at least `floor`. Never lowers it.
    pub fn at_least(mut self, floor: RatingCategory) -> Self {
        self.category = self.category.max(floor);
        self
    }
}

fn clamp_confidence(confidence: f32) -> f32 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

fn deserialize_confidence<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    f32::deserialize(deserializer).map(clamp_confidence)
}

/// Audio container extensions accepted for transcription
pub const SUPPORTED_AUDIO_FORMATS: &[&str] = &["wav", "mp3", "m4a", "ogg", "flac", "aac"];

/// Opaque recorded or uploaded audio
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// Encoded audio bytes
    pub data: Bytes,

    /// Container format (file extension without the dot)
    pub format: String,
}

impl AudioClip {
    /// Create a new audio clip
    pub fn new(data: impl Into<Bytes>, format: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            format: format.into().trim_start_matches('.').to_ascii_lowercase(),
        }
    }

    /// Whether the transcriber accepts this container format
    pub fn is_supported_format(&self) -> bool {
        SUPPORTED_AUDIO_FORMATS.contains(&self.format.as_str())
    }
}

/// Opaque generated image
#[derive(Debug, Clone)]
pub struct ImageHandle {
    /// Encoded image bytes
    pub data: Bytes,

    /// MIME type of `data`
    pub mime_type: String,

    /// Where the provider served the image from, if anywhere
    pub source_url: Option<String>,

    /// Prompt as rewritten by the provider, if it did so
    pub revised_prompt: Option<String>,
}

impl ImageHandle {
    /// Create a new image handle
    pub fn new(data: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
            source_url: None,
            revised_prompt: None,
        }
    }

    /// Attach the provider URL
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Attach the provider's revised prompt
    pub fn with_revised_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.revised_prompt = Some(prompt.into());
        self
    }
}

/// Session-unique identifier of a gallery entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(Uuid);

impl EntryId {
    /// Generate a fresh random id
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Immutable record of one successful, non-blocked generation
#[derive(Debug, Clone)]
pub struct GalleryEntry {
    id: Option<EntryId>,
    prompt: Prompt,
    image: ImageHandle,
    rating: RatingCategory,
    blocked: bool,
    created_at: DateTime<Utc>,
    warnings: Vec<String>,
}

impl GalleryEntry {
    /// Create an entry without an id; the gallery assigns one on append
    pub fn new(
        prompt: Prompt,
        image: ImageHandle,
        rating: RatingCategory,
        blocked: bool,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            id: None,
            prompt,
            image,
            rating,
            blocked,
            created_at: Utc::now(),
            warnings,
        }
    }

    /// Preassign an id
    pub fn with_id(mut self, id: EntryId) -> Self {
        self.id = Some(id);
        self
    }

    /// Entry id; always set once the entry is in a gallery
    pub fn id(&self) -> Option<EntryId> {
        self.id
    }

    pub fn prompt(&self) -> &Prompt {
        &self.prompt
    }

    pub fn image(&self) -> &ImageHandle {
        &self.image
    }

    pub fn rating(&self) -> RatingCategory {
        self.rating
    }

    pub fn blocked(&self) -> bool {
        self.blocked
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Banner text shown above mature results
    pub fn content_warning(&self) -> Option<String> {
        self.rating
            .requires_warning()
            .then(|| format!("{} Content Warning", self.rating.age_label()))
    }
}

/// Read-time filter over gallery contents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryView {
    /// Exclude entries rated `Adult`
    pub hide_adult: bool,
}

impl GalleryView {
    /// Show everything
    pub fn all() -> Self {
        Self { hide_adult: false }
    }

    /// Hide adult-rated entries
    pub fn hide_adult() -> Self {
        Self { hide_adult: true }
    }

    /// Whether an entry passes the filter
    pub fn admits(&self, entry: &GalleryEntry) -> bool {
        !(self.hide_adult && entry.rating() == RatingCategory::Adult)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_total_order() {
        use RatingCategory::*;
        assert!(General < Teen && Teen < Mature && Mature < Adult);
        assert_eq!(RatingCategory::ALL.iter().max(), Some(&Adult));
        assert_eq!(Teen.max(Mature), Mature);
    }

    #[test]
    fn test_rating_parse_and_serde() {
        assert_eq!("Mature".parse::<RatingCategory>().unwrap(), RatingCategory::Mature);
        assert!("nc-17".parse::<RatingCategory>().is_err());

        let yaml: RatingCategory = serde_yaml::from_str("teen").unwrap();
        assert_eq!(yaml, RatingCategory::Teen);
        assert_eq!(serde_json::to_string(&RatingCategory::Adult).unwrap(), "\"adult\"");
    }

    #[test]
    fn test_rating_labels() {
        assert_eq!(RatingCategory::Adult.age_label(), "18+");
        assert_eq!(RatingCategory::General.description(), "Suitable for all ages");
        assert!(!RatingCategory::Teen.requires_warning());
        assert!(RatingCategory::Mature.requires_warning());
    }

    #[test]
    fn test_verdict_confidence_clamped() {
        assert_eq!(ModerationVerdict::rated(RatingCategory::Teen, 1.7).confidence(), 1.0);
        assert_eq!(ModerationVerdict::rated(RatingCategory::Teen, -0.2).confidence(), 0.0);
        assert_eq!(ModerationVerdict::rated(RatingCategory::Teen, f32::NAN).confidence(), 0.0);
    }

    #[test]
    fn test_deserialized_confidence_clamped() {
        let json = r#"{"flagged":false,"category":"teen","reasons":[],"confidence":1.7}"#;
        let verdict: ModerationVerdict = serde_json::from_str(json).unwrap();
        assert_eq!(verdict.confidence(), 1.0);

        let json = r#"{"flagged":true,"category":"adult","reasons":["x"],"confidence":-3.0}"#;
        let verdict: ModerationVerdict = serde_json::from_str(json).unwrap();
        assert_eq!(verdict.confidence(), 0.0);
        assert!(verdict.flagged);
    }

    #[test]
    fn test_at_least_never_lowers() {
        let verdict = ModerationVerdict::rated(RatingCategory::Mature, 0.5);
        assert_eq!(verdict.clone().at_least(RatingCategory::Teen).category, RatingCategory::Mature);
        assert_eq!(verdict.at_least(RatingCategory::Adult).category, RatingCategory::Adult);
    }

    #[test]
    fn test_audio_format() {
        assert!(AudioClip::new(vec![0u8; 4], ".WAV").is_supported_format());
        assert!(!AudioClip::new(vec![0u8; 4], "midi").is_supported_format());
    }

    #[test]
    fn test_view_and_warning() {
        let prompt = Prompt::new("a stormy battlefield").unwrap();
        let image = ImageHandle::new(vec![1u8, 2, 3], "image/png");
        let adult = GalleryEntry::new(
            prompt.clone(),
            image.clone(),
            RatingCategory::Adult,
            false,
            vec![],
        );
        let teen = GalleryEntry::new(prompt, image, RatingCategory::Teen, false, vec![]);

        assert!(GalleryView::all().admits(&adult));
        assert!(!GalleryView::hide_adult().admits(&adult));
        assert!(GalleryView::hide_adult().admits(&teen));

        assert_eq!(adult.content_warning().as_deref(), Some("18+ Content Warning"));
        assert!(teen.content_warning().is_none());
    }
}
