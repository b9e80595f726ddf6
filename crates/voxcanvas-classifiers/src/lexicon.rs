//! Maturity indicator lexicon
//!
//! Whole-word keyword lists that raise a prompt's rating floor. Unlike the
//! high-severity overrides these never block; they only keep a prompt from
//! being rated below what its vocabulary clearly implies.

use regex::Regex;
use voxcanvas_core::{Error, RatingCategory, Result};

const ADULT_TERMS: &[&str] = &[
    "nude", "naked", "nudity", "sexual", "explicit", "pornographic", "erotic", "intimate",
    "seductive", "provocative", "sensual",
];

const VIOLENCE_TERMS: &[&str] = &[
    "violence", "violent", "weapon", "weapons", "gun", "guns", "blood", "bloody", "death",
    "kill", "killing", "murder", "fight", "battle", "war", "destruction", "harm", "gore",
];

const INAPPROPRIATE_TERMS: &[&str] = &[
    "hate", "racist", "discriminatory", "offensive", "inappropriate", "illegal", "drugs",
    "gambling", "extremist",
];

struct LexiconGroup {
    pattern: Regex,
    floor: RatingCategory,
    reason: &'static str,
}

/// Keyword groups mapped to rating floors
pub struct MaturityLexicon {
    groups: Vec<LexiconGroup>,
}

/// Result of scanning a prompt
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LexiconScan {
    /// Highest floor among matched groups
    pub floor: RatingCategory,

    /// One reason per matched group, most severe first
    pub reasons: Vec<String>,
}

impl MaturityLexicon {
    /// Build the lexicon
    pub fn new() -> Result<Self> {
        let groups = vec![
            group(ADULT_TERMS, RatingCategory::Adult, "adult content indicators")?,
            group(VIOLENCE_TERMS, RatingCategory::Mature, "violent content indicators")?,
            group(
                INAPPROPRIATE_TERMS,
                RatingCategory::Teen,
                "inappropriate content indicators",
            )?,
        ];
        Ok(Self { groups })
    }

    /// Scan text for maturity indicators
    pub fn scan(&self, text: &str) -> LexiconScan {
        let mut scan = LexiconScan::default();

        for group in &self.groups {
            if group.pattern.is_match(text) {
                scan.floor = scan.floor.max(group.floor);
                scan.reasons.push(group.reason.to_string());
            }
        }

        scan
    }
}

fn group(terms: &[&str], floor: RatingCategory, reason: &'static str) -> Result<LexiconGroup> {
    let pattern = Regex::new(&format!(r"(?i)\b(?:{})\b", terms.join("|")))
        .map_err(|e| Error::config(format!("Failed to build lexicon: {}", e)))?;
    Ok(LexiconGroup {
        pattern,
        floor,
        reason,
    })
}
