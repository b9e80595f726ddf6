//! High-severity override terms

use aho_corasick::AhoCorasick;
use serde::{Deserialize, Serialize};
use std::fmt;
use voxcanvas_core::{Error, Result};

/// Families of content that are blocked outright
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityFamily {
    Hate,
    SelfHarm,
    SexualExploitation,
    ViolentIllegal,
    /// Operator-configured terms
    Custom,
}

impl SeverityFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hate => "hate",
            Self::SelfHarm => "self-harm",
            Self::SexualExploitation => "sexual exploitation",
            Self::ViolentIllegal => "violent or illegal",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for SeverityFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Curated terms that force a blocked verdict
const BUILTIN_TERMS: &[(&str, SeverityFamily)] = &[
    ("ethnic cleansing", SeverityFamily::Hate),
    ("white power", SeverityFamily::Hate),
    ("racial slur", SeverityFamily::Hate),
    ("nazi propaganda", SeverityFamily::Hate),
    ("genocide", SeverityFamily::Hate),
    ("suicide", SeverityFamily::SelfHarm),
    ("self-harm", SeverityFamily::SelfHarm),
    ("self harm", SeverityFamily::SelfHarm),
    ("kill myself", SeverityFamily::SelfHarm),
    ("cutting myself", SeverityFamily::SelfHarm),
    ("child exploitation", SeverityFamily::SexualExploitation),
    ("child porn", SeverityFamily::SexualExploitation),
    ("underage sex", SeverityFamily::SexualExploitation),
    ("sexualized child", SeverityFamily::SexualExploitation),
    ("non-consensual", SeverityFamily::SexualExploitation),
    ("revenge porn", SeverityFamily::SexualExploitation),
    ("bomb making", SeverityFamily::ViolentIllegal),
    ("build a bomb", SeverityFamily::ViolentIllegal),
    ("mass shooting", SeverityFamily::ViolentIllegal),
    ("school shooting", SeverityFamily::ViolentIllegal),
    ("terrorist attack", SeverityFamily::ViolentIllegal),
    ("beheading", SeverityFamily::ViolentIllegal),
];

/// A matched high-severity term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideHit {
    pub family: SeverityFamily,
    pub term: String,
}

impl OverrideHit {
    /// Reason string surfaced to the user
    pub fn reason(&self) -> String {
        format!("blocked {} term: {}", self.family, self.term)
    }
}

/// Case-insensitive matcher over the high-severity term set, using Aho-Corasick
pub struct HighSeverityMatcher {
    automaton: AhoCorasick,
    terms: Vec<(String, SeverityFamily)>,
}

impl HighSeverityMatcher {
    /// Build a matcher over the curated terms plus operator-supplied ones
    pub fn new(extra_terms: &[String]) -> Result<Self> {
        let mut terms: Vec<(String, SeverityFamily)> = BUILTIN_TERMS
            .iter()
            .map(|(term, family)| (term.to_string(), *family))
            .collect();

        terms.extend(
            extra_terms
                .iter()
                .map(|term| term.trim())
                .filter(|term| !term.is_empty())
                .map(|term| (term.to_string(), SeverityFamily::Custom)),
        );

        let automaton = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(terms.iter().map(|(term, _)| term.as_str()))
            .map_err(|e| Error::config(format!("Failed to build override matcher: {}", e)))?;

        Ok(Self { automaton, terms })
    }

    /// All distinct hits, in order of first appearance
    pub fn find(&self, text: &str) -> Vec<OverrideHit> {
        let mut hits: Vec<OverrideHit> = Vec::new();

        for m in self.automaton.find_iter(text) {
            let (term, family) = &self.terms[m.pattern().as_usize()];
            if !hits.iter().any(|hit| &hit.term == term) {
                hits.push(OverrideHit {
                    family: *family,
                    term: term.clone(),
                });
            }
        }

        hits
    }

    /// Number of terms in the set
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }
}
