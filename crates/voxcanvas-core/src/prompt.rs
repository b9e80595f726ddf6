//! Prompts driving image generation

use crate::error::{Error, Result};
use serde::Serialize;
use std::borrow::Cow;

/// Longest prompt, in characters, forwarded to the image generator
pub const MAX_PROMPT_CHARS: usize = 4000;

/// Prompts shorter than this get a "too short" advisory
const MIN_DESCRIPTIVE_CHARS: usize = 10;

/// Text driving a single generation, transcribed or typed.
///
/// A prompt keeps the original transcript next to the text the user finally
/// submitted, so an edited transcript can still be traced back to what was
/// said. The submitted text is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    text: String,
    transcript: Option<String>,
}

impl Prompt {
    /// Create a prompt from typed text
    pub fn new(text: impl Into<String>) -> Result<Self> {
        Ok(Self {
            text: non_empty(text.into())?,
            transcript: None,
        })
    }

    /// Create a prompt from a speech transcript
    pub fn from_transcript(transcript: impl Into<String>) -> Result<Self> {
        let text = non_empty(transcript.into())?;
        Ok(Self {
            transcript: Some(text.clone()),
            text,
        })
    }

    /// Replace the submitted text while keeping the transcript history
    pub fn edit(&self, text: impl Into<String>) -> Result<Self> {
        Ok(Self {
            text: non_empty(text.into())?,
            transcript: self.transcript.clone(),
        })
    }

    /// The submitted text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The original transcript, if the prompt came from speech
    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }

    /// Whether the submitted text differs from the transcript
    pub fn is_edited(&self) -> bool {
        self.transcript
            .as_deref()
            .is_some_and(|transcript| transcript != self.text)
    }

    /// Text handed to the generator, cut to [`MAX_PROMPT_CHARS`] characters
    pub fn generation_text(&self) -> Cow<'_, str> {
        match self.text.char_indices().nth(MAX_PROMPT_CHARS) {
            Some((cut, _)) => {
                tracing::debug!("Prompt truncated to {} characters", MAX_PROMPT_CHARS);
                Cow::Owned(self.text[..cut].to_string())
            }
            None => Cow::Borrowed(&self.text),
        }
    }

    /// Advisory checks shown to the user before generation. Never blocks.
    pub fn validate(&self) -> PromptAdvice {
        let mut advice = PromptAdvice::default();
        let chars = self.text.chars().count();

        if chars < MIN_DESCRIPTIVE_CHARS {
            advice.issues.push("Prompt is too short".to_string());
            advice
                .recommendations
                .push("Add more descriptive details".to_string());
        }

        if chars > MAX_PROMPT_CHARS {
            advice.issues.push("Prompt is too long".to_string());
            advice.recommendations.push(format!(
                "Reduce prompt length to under {} characters",
                MAX_PROMPT_CHARS
            ));
        }

        advice
    }
}

impl std::fmt::Display for Prompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Non-blocking advice about a prompt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PromptAdvice {
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

impl PromptAdvice {
    /// True when no issue was found
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

fn non_empty(text: String) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyPrompt);
    }
    Ok(trimmed.to_string())
}
