//! Derivations over a parsed document: entity buckets, syntax statistics,
//! key phrases, sentiment, experience/education mentions and text statistics.

use chrono::Utc;
use regex::Regex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::nlp::doc::{ParsedDoc, RawEntity};
use crate::nlp::skills::{ScoringConfig, SkillReport};

/// The upstream model reports no per-entity confidence.
const ENTITY_CONFIDENCE: f64 = 0.8;

const MAX_KEY_PHRASES: usize = 20;

const POSITIVE_WORDS: &[&str] = &[
    "goed", "uitstekend", "succesvol", "positief", "sterk", "ervaren", "expert",
];

const NEGATIVE_WORDS: &[&str] = &["slecht", "zwak", "probleem", "moeilijk", "beperkt"];

const EDUCATION_KEYWORDS: &[&str] = &[
    "universiteit", "hogeschool", "bachelor", "master", "diploma", "certificaat", "opleiding",
    "studie", "afgestudeerd", "doctoraal", "phd", "mbo", "hbo", "wo",
];

static EXPERIENCE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(\d+)\s*jaar\s*(ervaring|gewerkt)",
        r"(?i)(\d+)\s*jaren\s*(ervaring|gewerkt)",
        r"(?i)sinds\s*(\d{4})",
        r"(?i)(\d{4})\s*-\s*(\d{4}|\w+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static experience pattern"))
    .collect()
});

#[derive(Debug, Clone, Serialize)]
pub struct EntityMatch {
    pub text: String,
    pub label: String,
    pub start: usize,
    pub end: usize,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EntityBuckets {
    pub persons: Vec<EntityMatch>,
    pub organizations: Vec<EntityMatch>,
    pub locations: Vec<EntityMatch>,
    pub dates: Vec<EntityMatch>,
    pub money: Vec<EntityMatch>,
    pub other: Vec<EntityMatch>,
}

impl EntityBuckets {
    pub fn total(&self) -> usize {
        self.persons.len()
            + self.organizations.len()
            + self.locations.len()
            + self.dates.len()
            + self.money.len()
            + self.other.len()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyntaxAnalysis {
    pub pos_distribution: HashMap<String, usize>,
    pub dependency_distribution: HashMap<String, usize>,
    pub sentence_count: usize,
    pub token_count: usize,
    pub complexity_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyPhrase {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Sentiment {
    pub score: f64,
    pub positive_indicators: usize,
    pub negative_indicators: usize,
    pub overall: &'static str,
}

/// Experience and education mentions share the `{text, type, start, end}`
/// wire shape.
#[derive(Debug, Clone, Serialize)]
pub struct TextMention {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextStatistics {
    pub character_count: usize,
    pub word_count: usize,
    pub sentence_count: usize,
    pub average_words_per_sentence: f64,
    pub unique_words: usize,
    pub lexical_diversity: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessingInfo {
    pub model: String,
    pub language: &'static str,
    pub timestamp: String,
    pub text_length: usize,
    pub tokens: usize,
    pub sentences: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub entities: EntityBuckets,
    pub skills: SkillReport,
    pub syntax: SyntaxAnalysis,
    pub key_phrases: Vec<KeyPhrase>,
    pub sentiment: Sentiment,
    pub experience: Vec<TextMention>,
    pub education: Vec<TextMention>,
    pub statistics: TextStatistics,
    pub processing_info: ProcessingInfo,
}

pub fn analyze(
    doc: &ParsedDoc,
    text: &str,
    model: &str,
    scoring: &ScoringConfig,
) -> AnalysisResult {
    AnalysisResult {
        entities: bucket_entities(&doc.entities),
        skills: SkillReport::extract(doc, text, scoring),
        syntax: analyze_syntax(doc),
        key_phrases: extract_key_phrases(doc),
        sentiment: analyze_sentiment(doc),
        experience: extract_experience(text),
        education: extract_education(doc),
        statistics: calculate_statistics(doc, text),
        processing_info: ProcessingInfo {
            model: model.to_string(),
            language: "nl",
            timestamp: Utc::now().to_rfc3339(),
            text_length: text.chars().count(),
            tokens: doc.tokens.len(),
            sentences: doc.sentence_count,
        },
    }
}

/// Pure reclassification of model output; emission order is preserved.
pub fn bucket_entities(entities: &[RawEntity]) -> EntityBuckets {
    let mut buckets = EntityBuckets::default();
    for entity in entities {
        let info = EntityMatch {
            text: entity.text.clone(),
            label: entity.label.clone(),
            start: entity.start,
            end: entity.end,
            confidence: ENTITY_CONFIDENCE,
        };
        match entity.label.as_str() {
            "PERSON" | "PER" => buckets.persons.push(info),
            "ORG" | "ORGANIZATION" => buckets.organizations.push(info),
            "LOC" | "LOCATION" | "GPE" => buckets.locations.push(info),
            "DATE" | "TIME" => buckets.dates.push(info),
            "MONEY" | "CURRENCY" => buckets.money.push(info),
            _ => buckets.other.push(info),
        }
    }
    buckets
}

pub fn analyze_syntax(doc: &ParsedDoc) -> SyntaxAnalysis {
    let mut pos_distribution: HashMap<String, usize> = HashMap::new();
    let mut dependency_distribution: HashMap<String, usize> = HashMap::new();
    for token in &doc.tokens {
        *pos_distribution.entry(token.pos.clone()).or_default() += 1;
        *dependency_distribution.entry(token.dep.clone()).or_default() += 1;
    }
    SyntaxAnalysis {
        pos_distribution,
        dependency_distribution,
        sentence_count: doc.sentence_count,
        token_count: doc.tokens.len(),
        complexity_score: complexity_score(doc),
    }
}

fn complexity_score(doc: &ParsedDoc) -> f64 {
    if doc.sentence_count == 0 {
        return 0.0;
    }
    let average_sentence_length = doc.tokens.len() as f64 / doc.sentence_count as f64;

    let alpha: Vec<&str> = doc
        .tokens
        .iter()
        .filter(|t| t.is_alpha)
        .map(|t| t.lemma.as_str())
        .collect();
    let unique: HashSet<String> = alpha.iter().map(|l| l.to_lowercase()).collect();
    let unique_ratio = if alpha.is_empty() {
        0.0
    } else {
        unique.len() as f64 / alpha.len() as f64
    };

    (average_sentence_length / 20.0 + unique_ratio).min(1.0)
}

pub fn extract_key_phrases(doc: &ParsedDoc) -> Vec<KeyPhrase> {
    let mut phrases = Vec::new();

    for chunk in &doc.noun_chunks {
        if chunk.text.split_whitespace().count() >= 2 {
            phrases.push(KeyPhrase {
                text: chunk.text.clone(),
                kind: "noun_chunk",
                start: chunk.start,
                end: chunk.end,
            });
        }
    }

    for token in &doc.tokens {
        if matches!(token.pos.as_str(), "NOUN" | "PROPN")
            && token.text.chars().count() > 6
            && !token.is_stop
        {
            phrases.push(KeyPhrase {
                text: token.text.clone(),
                kind: "technical_term",
                start: token.start,
                end: token.end,
            });
        }
    }

    phrases.truncate(MAX_KEY_PHRASES);
    phrases
}

pub fn analyze_sentiment(doc: &ParsedDoc) -> Sentiment {
    let mut positive = 0;
    let mut negative = 0;
    for token in &doc.tokens {
        let lemma = token.lemma.to_lowercase();
        if POSITIVE_WORDS.contains(&lemma.as_str()) {
            positive += 1;
        } else if NEGATIVE_WORDS.contains(&lemma.as_str()) {
            negative += 1;
        }
    }

    let total = positive + negative;
    let score = if total == 0 {
        0.5
    } else {
        positive as f64 / total as f64
    };

    let overall = if score > 0.6 {
        "positive"
    } else if score < 0.4 {
        "negative"
    } else {
        "neutral"
    };

    Sentiment {
        score,
        positive_indicators: positive,
        negative_indicators: negative,
        overall,
    }
}

pub fn extract_experience(text: &str) -> Vec<TextMention> {
    let mut mentions = Vec::new();
    for pattern in EXPERIENCE_PATTERNS.iter() {
        for m in pattern.find_iter(text) {
            mentions.push(TextMention {
                text: m.as_str().to_string(),
                kind: "duration",
                start: m.start(),
                end: m.end(),
            });
        }
    }
    mentions
}

pub fn extract_education(doc: &ParsedDoc) -> Vec<TextMention> {
    doc.tokens
        .iter()
        .filter(|t| {
            let lemma = t.lemma.to_lowercase();
            EDUCATION_KEYWORDS.contains(&lemma.as_str())
                || EDUCATION_KEYWORDS.contains(&t.text.to_lowercase().as_str())
        })
        .map(|t| TextMention {
            text: t.text.clone(),
            kind: "education_keyword",
            start: t.start,
            end: t.end,
        })
        .collect()
}

pub fn calculate_statistics(doc: &ParsedDoc, text: &str) -> TextStatistics {
    let words: Vec<&crate::nlp::doc::Token> =
        doc.tokens.iter().filter(|t| t.is_alpha).collect();
    let unique: HashSet<String> = words.iter().map(|t| t.lemma.to_lowercase()).collect();

    TextStatistics {
        character_count: text.chars().count(),
        word_count: words.len(),
        sentence_count: doc.sentence_count,
        average_words_per_sentence: if doc.sentence_count > 0 {
            words.len() as f64 / doc.sentence_count as f64
        } else {
            0.0
        },
        unique_words: unique.len(),
        lexical_diversity: if words.is_empty() {
            0.0
        } else {
            unique.len() as f64 / words.len() as f64
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::doc::{NounChunk, Token, parse_whitespace};

    fn entity(label: &str) -> RawEntity {
        RawEntity {
            text: format!("{label}-text"),
            label: label.to_string(),
            start: 0,
            end: 4,
        }
    }

    #[test]
    fn entities_land_in_their_buckets() {
        let buckets = bucket_entities(&[
            entity("PERSON"),
            entity("PER"),
            entity("ORG"),
            entity("GPE"),
            entity("LOC"),
            entity("DATE"),
            entity("MONEY"),
            entity("WORK_OF_ART"),
        ]);
        assert_eq!(buckets.persons.len(), 2);
        assert_eq!(buckets.organizations.len(), 1);
        assert_eq!(buckets.locations.len(), 2);
        assert_eq!(buckets.dates.len(), 1);
        assert_eq!(buckets.money.len(), 1);
        assert_eq!(buckets.other.len(), 1);
        assert_eq!(buckets.total(), 8);
    }

    #[test]
    fn entity_order_is_preserved_within_a_bucket() {
        let mut first = entity("PERSON");
        first.text = "Jan".to_string();
        let mut second = entity("PER");
        second.text = "Piet".to_string();
        let buckets = bucket_entities(&[first, second]);
        assert_eq!(buckets.persons[0].text, "Jan");
        assert_eq!(buckets.persons[1].text, "Piet");
    }

    #[test]
    fn sentiment_counts_positive_and_negative_lemmas() {
        let doc = parse_whitespace("goed sterk slecht verder");
        let sentiment = analyze_sentiment(&doc);
        assert_eq!(sentiment.positive_indicators, 2);
        assert_eq!(sentiment.negative_indicators, 1);
        assert!((sentiment.score - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(sentiment.overall, "positive");
    }

    #[test]
    fn sentiment_without_indicators_is_neutral() {
        let sentiment = analyze_sentiment(&parse_whitespace("gewoon een zin"));
        assert!((sentiment.score - 0.5).abs() < 1e-9);
        assert_eq!(sentiment.overall, "neutral");
    }

    #[test]
    fn experience_patterns_match_durations_and_ranges() {
        let mentions = extract_experience("5 jaar ervaring, sinds 2019, 2018 - 2022");
        let texts: Vec<&str> = mentions.iter().map(|m| m.text.as_str()).collect();
        assert!(texts.contains(&"5 jaar ervaring"));
        assert!(texts.contains(&"sinds 2019"));
        assert!(texts.contains(&"2018 - 2022"));
        for m in &mentions {
            assert_eq!(m.kind, "duration");
        }
    }

    #[test]
    fn education_keywords_are_reported_with_offsets() {
        let text = "Afgestudeerd aan de universiteit";
        let mentions = extract_education(&parse_whitespace(text));
        assert_eq!(mentions.len(), 2);
        assert_eq!(&text[mentions[1].start..mentions[1].end], "universiteit");
        assert_eq!(mentions[0].kind, "education_keyword");
    }

    #[test]
    fn complexity_is_zero_without_sentences() {
        assert_eq!(complexity_score(&ParsedDoc::default()), 0.0);
    }

    #[test]
    fn complexity_is_clamped_to_one() {
        let mut doc = parse_whitespace("woord");
        // One sentence carrying far more tokens than the scale expects.
        doc.tokens = (0..100).map(|i| Token {
            text: format!("woord{i}"),
            lemma: format!("woord{i}"),
            pos: "NOUN".to_string(),
            dep: "obj".to_string(),
            start: 0,
            end: 1,
            is_alpha: true,
            is_stop: false,
        }).collect();
        doc.sentence_count = 1;
        assert_eq!(complexity_score(&doc), 1.0);
    }

    #[test]
    fn key_phrases_cap_at_twenty() {
        let mut doc = ParsedDoc::default();
        for i in 0..30 {
            doc.noun_chunks.push(NounChunk {
                text: format!("lange technische frase {i}"),
                start: 0,
                end: 1,
            });
        }
        assert_eq!(extract_key_phrases(&doc).len(), 20);
    }

    #[test]
    fn key_phrases_take_chunks_and_long_nouns() {
        let mut doc = parse_whitespace("softwareontwikkeling in een klein team");
        doc.tokens[0].pos = "NOUN".to_string();
        doc.noun_chunks.push(NounChunk {
            text: "een klein team".to_string(),
            start: 24,
            end: 38,
        });
        let phrases = extract_key_phrases(&doc);
        assert!(phrases.iter().any(|p| p.kind == "noun_chunk" && p.text == "een klein team"));
        assert!(phrases
            .iter()
            .any(|p| p.kind == "technical_term" && p.text == "softwareontwikkeling"));
    }

    #[test]
    fn statistics_count_words_and_lemmas() {
        let doc = parse_whitespace("Python python is leuk.");
        let stats = calculate_statistics(&doc, "Python python is leuk.");
        assert_eq!(stats.word_count, 4);
        // "python" twice under one lemma.
        assert_eq!(stats.unique_words, 3);
        assert_eq!(stats.sentence_count, 1);
        assert!((stats.lexical_diversity - 0.75).abs() < 1e-9);
        assert_eq!(stats.character_count, 22);
    }

    #[test]
    fn syntax_distributions_count_tags() {
        let mut doc = parse_whitespace("een twee drie");
        doc.tokens[0].pos = "NOUN".to_string();
        doc.tokens[1].pos = "NOUN".to_string();
        doc.tokens[2].pos = "VERB".to_string();
        let syntax = analyze_syntax(&doc);
        assert_eq!(syntax.pos_distribution["NOUN"], 2);
        assert_eq!(syntax.pos_distribution["VERB"], 1);
        assert_eq!(syntax.token_count, 3);
    }
}
