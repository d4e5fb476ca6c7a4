//! Typed view of a parsed document as produced at the model boundary.
//!
//! All offsets are byte offsets into the submitted text; the engine converts
//! the model's character offsets when it builds these values. Everything
//! downstream of the model works on this type only.

#[derive(Debug, Clone)]
pub struct Token {
    pub text: String,
    pub lemma: String,
    /// Universal POS tag, e.g. `NOUN`, `PROPN`, `VERB`.
    pub pos: String,
    /// Dependency relation label, e.g. `nsubj`, `obj`, `ROOT`.
    pub dep: String,
    pub start: usize,
    pub end: usize,
    pub is_alpha: bool,
    pub is_stop: bool,
}

#[derive(Debug, Clone)]
pub struct RawEntity {
    pub text: String,
    pub label: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone)]
pub struct NounChunk {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedDoc {
    pub tokens: Vec<Token>,
    pub sentence_count: usize,
    pub noun_chunks: Vec<NounChunk>,
    pub entities: Vec<RawEntity>,
}

impl ParsedDoc {
    /// Index of the token whose span contains the given byte offset.
    pub fn token_at(&self, byte_offset: usize) -> Option<usize> {
        self.tokens
            .iter()
            .position(|t| t.start <= byte_offset && byte_offset < t.end)
    }
}

#[cfg(test)]
pub(crate) fn parse_whitespace(text: &str) -> ParsedDoc {
    // Test stand-in for the real pipeline: whitespace tokens, lowercased
    // lemmas, sentences counted by full stops.
    let mut tokens = Vec::new();
    let mut offset = 0;
    for word in text.split_whitespace() {
        let start = text[offset..].find(word).map(|i| offset + i).unwrap_or(offset);
        let end = start + word.len();
        let trimmed = word.trim_matches(|c: char| !c.is_alphanumeric());
        tokens.push(Token {
            text: word.to_string(),
            lemma: trimmed.to_lowercase(),
            pos: "X".to_string(),
            dep: "dep".to_string(),
            start,
            end,
            is_alpha: !trimmed.is_empty() && trimmed.chars().all(char::is_alphabetic),
            is_stop: false,
        });
        offset = end;
    }
    ParsedDoc {
        tokens,
        sentence_count: text.matches('.').count().max(1),
        noun_chunks: Vec::new(),
        entities: Vec::new(),
    }
}
