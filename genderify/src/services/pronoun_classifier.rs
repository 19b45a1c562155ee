//! First-pronoun gender classifier
//!
//! The first qualifying pronoun decides. Articles establish their subject's
//! pronoun early; later mentions of other people are ignored.

use crate::models::GenderLabel;

/// Tokens kept on each side of the deciding pronoun
pub const CONTEXT_RADIUS: usize = 5;

/// A classified biography
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub gender: GenderLabel,
    /// Up to `CONTEXT_RADIUS` tokens either side of the pronoun, as written
    pub context: String,
}

/// Label for a normalised token, if it is a pronoun we track
pub fn pronoun_label(token: &str) -> Option<GenderLabel> {
    match token {
        "he" | "him" | "his" => Some(GenderLabel::Male),
        "she" | "her" => Some(GenderLabel::Female),
        "they" | "them" | "their" => Some(GenderLabel::Nonbinary),
        _ => None,
    }
}

/// Classify biography text by its first pronoun
///
/// Returns `None` when the text contains none of the tracked pronouns.
pub fn classify(text: &str) -> Option<Classification> {
    let tokens: Vec<&str> = text.split_whitespace().collect();

    tokens.iter().enumerate().find_map(|(ix, token)| {
        let gender = pronoun_label(&normalise(token))?;
        let start = ix.saturating_sub(CONTEXT_RADIUS);
        let end = (ix + CONTEXT_RADIUS + 1).min(tokens.len());
        Some(Classification {
            gender,
            context: tokens[start..end].join(" "),
        })
    })
}

/// Lower-case, keeping only word characters
fn normalise(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .flat_map(char::to_lowercase)
        .collect()
}
