//! Message normalization.
//!
//! Folds message text and embed parts into one case-folded blob with Discord
//! decorations removed. Custom emoji tags are reduced to `:name:` so their
//! numeric ids never read as amounts.

use fancy_regex::Regex;

use crate::common::messages::{EmbedPayload, IncomingMessage};

/// Markers that identify a card-game embed.
const CARD_MARKERS: [&str; 2] = ["blackjack", "dealer"];

/// Normalized view of a message, ready for classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMessage {
    pub text: String,
    pub has_card_markers: bool,
}

/// Normalizer with precompiled decoration patterns.
#[derive(Debug, Clone)]
pub struct Normalizer {
    /// Custom emojis (<:name:id> or <a:name:id>).
    emoji_pattern: Regex,
    /// User, role and channel mentions.
    mention_pattern: Regex,
    /// Markdown emphasis and code characters.
    markup_pattern: Regex,
    whitespace_pattern: Regex,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            emoji_pattern: Regex::new(r"<a?:([a-zA-Z0-9_]+):\d+>").unwrap(),
            mention_pattern: Regex::new(r"<(?:@[!&]?|#)\d+>").unwrap(),
            markup_pattern: Regex::new(r"[*`~]").unwrap(),
            whitespace_pattern: Regex::new(r"\s+").unwrap(),
        }
    }

    /// Normalize a message's text and embeds.
    pub fn normalize(&self, message: &IncomingMessage) -> NormalizedMessage {
        let embed_text = embed_blob(&message.embeds);

        let mut combined = message.raw_text.clone();
        if !embed_text.is_empty() {
            if !combined.is_empty() {
                combined.push('\n');
            }
            combined.push_str(&embed_text);
        }

        let lowered_embeds = embed_text.to_lowercase();
        let has_card_markers = CARD_MARKERS.iter().any(|m| lowered_embeds.contains(m));

        NormalizedMessage {
            text: self.clean(&combined),
            has_card_markers,
        }
    }

    /// Strip decorations, case-fold, and collapse whitespace.
    pub fn clean(&self, text: &str) -> String {
        let step1 = self.emoji_pattern.replace_all(text, ":$1:");
        let step2 = self.mention_pattern.replace_all(&step1, " ");
        let step3 = self.markup_pattern.replace_all(&step2, "");
        let step4 = self.whitespace_pattern.replace_all(&step3, " ");
        step4.trim().to_lowercase()
    }
}

/// Join embed parts: title, description, footer, then each field's name and value.
pub fn embed_blob(embeds: &[EmbedPayload]) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for embed in embeds {
        parts.extend(embed.title.as_deref());
        parts.extend(embed.description.as_deref());
        parts.extend(embed.footer.as_deref());
        for field in &embed.fields {
            parts.push(&field.name);
            parts.push(&field.value);
        }
    }
    parts.retain(|p| !p.is_empty());
    parts.join("\n")
}
