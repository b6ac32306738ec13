//! Masking of text that must survive machine translation unchanged.
//!
//! Structural tokens (`{{placeholders}}`, `<tags>`) become `@@TOKEN_n@@`;
//! parenthesized technical terms become `(@@TERM_n@@)`. [`ProtectedText::restore`]
//! puts the originals back.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use regex::Regex;

/// Default patterns: double-brace interpolation and HTML-like tags.
pub const DEFAULT_PROTECT_PATTERNS: &[&str] = &[r"\{\{[^{}]+\}\}", r"</?[\w\-]+(?:\s+[^>]*?)?>"];

const TOKEN_PREFIX: &str = "TOKEN";
const TERM_PREFIX: &str = "TERM";

#[derive(Debug, Clone)]
pub struct TextProtector {
    patterns: Vec<Regex>,
    mask_parentheticals: bool,
    parenthetical: Regex,
}

/// Masked text plus the sentinel -> original mapping needed to undo it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedText {
    pub text: String,
    pub mapping: Vec<(String, String)>,
}

impl TextProtector {
    pub fn new(patterns: &[String], mask_parentheticals: bool) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p).with_context(|| format!("Invalid protect pattern: \"{}\"", p)))
            .collect::<Result<Vec<_>>>()?;
        let parenthetical = Regex::new(r"\(([A-Za-z0-9 ._\-/+:#]+)\)")
            .context("Invalid parenthetical pattern")?;
        Ok(Self {
            patterns,
            mask_parentheticals,
            parenthetical,
        })
    }

    pub fn with_defaults() -> Result<Self> {
        let patterns: Vec<String> = DEFAULT_PROTECT_PATTERNS
            .iter()
            .map(|p| p.to_string())
            .collect();
        Self::new(&patterns, true)
    }

    pub fn protect(&self, input: &str) -> ProtectedText {
        let mut sentinels = SentinelAllocator::new(input);
        let mut text = input.to_string();
        let mut mapping = Vec::new();

        for pattern in &self.patterns {
            text = pattern
                .replace_all(&text, |caps: &regex::Captures| {
                    let token = sentinels.next(TOKEN_PREFIX);
                    mapping.push((token.clone(), caps[0].to_string()));
                    token
                })
                .into_owned();
        }

        if self.mask_parentheticals {
            text = self
                .parenthetical
                .replace_all(&text, |caps: &regex::Captures| {
                    let inner = &caps[1];
                    if !inner.chars().any(|c| c.is_ascii_alphabetic()) {
                        return caps[0].to_string();
                    }
                    let token = sentinels.next(TERM_PREFIX);
                    mapping.push((token.clone(), inner.to_string()));
                    format!("({})", token)
                })
                .into_owned();
        }

        ProtectedText { text, mapping }
    }
}

impl ProtectedText {
    /// Top-level sentinels that do not appear verbatim in `translated`.
    ///
    /// Sentinels captured inside a later mask are not in the masked text and
    /// are checked through their enclosing sentinel instead.
    pub fn missing_sentinels(&self, translated: &str) -> Vec<&str> {
        self.mapping
            .iter()
            .map(|(token, _)| token.as_str())
            .filter(|token| self.text.contains(token) && !translated.contains(token))
            .collect()
    }

    /// Replace every sentinel in `translated` with its original text.
    pub fn restore(&self, translated: &str) -> String {
        // A later pass may capture an earlier sentinel (a tag whose attribute
        // holds a placeholder), so undo in reverse allocation order.
        let mut out = translated.to_string();
        for (token, original) in self.mapping.iter().rev() {
            out = out.replace(token.as_str(), original);
        }
        out
    }
}

/// Hands out `@@PREFIX_n@@` sentinels that do not occur in the input.
struct SentinelAllocator<'a> {
    input: &'a str,
    next: usize,
}

impl<'a> SentinelAllocator<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, next: 0 }
    }

    fn next(&mut self, prefix: &str) -> String {
        loop {
            let token = format!("@@{}_{}@@", prefix, self.next);
            self.next += 1;
            if !self.input.contains(&token) {
                return token;
            }
        }
    }
}

/// Characters that must survive translation: non-ASCII symbols such as
/// emoji, arrows and check marks. Letters of any script, digits, whitespace
/// and typographic punctuation are not special.
pub fn is_special_char(c: char) -> bool {
    if c.is_ascii() || c.is_alphanumeric() || c.is_whitespace() {
        return false;
    }
    !matches!(
        c,
        '\u{00A1}'
            | '\u{00AB}'
            | '\u{00B7}'
            | '\u{00BB}'
            | '\u{00BF}'
            | '\u{2000}'..='\u{206F}'
            | '\u{3000}'..='\u{303F}'
            | '\u{FF01}'..='\u{FF0F}'
            | '\u{FE0F}'
    )
}

pub fn special_chars(text: &str) -> BTreeSet<char> {
    text.chars().filter(|c| is_special_char(*c)).collect()
}

/// Special characters of `original` that are absent from `translated`.
pub fn missing_special_chars(original: &str, translated: &str) -> BTreeSet<char> {
    let present = special_chars(translated);
    special_chars(original)
        .into_iter()
        .filter(|c| !present.contains(c))
        .collect()
}
