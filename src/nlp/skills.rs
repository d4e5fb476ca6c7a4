//! Dictionary-based skill extraction with a context confidence heuristic.
//!
//! Each category is scanned independently with a case-insensitive
//! Aho-Corasick automaton over the original text; a hit counts only when both
//! neighbours are word boundaries. The confidence score is a heuristic, not a
//! calibrated probability: a fixed base plus boosts for experience/project
//! vocabulary near the match.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::nlp::doc::{ParsedDoc, Token};

pub const PROGRAMMING_LANGUAGES: &[&str] = &[
    "python", "javascript", "java", "c#", "php", "ruby", "go", "rust", "swift", "kotlin",
    "typescript", "scala", "perl", "r", "matlab", "sql", "html", "css", "sass", "less", "c++",
    "c", "objective-c", "dart", "lua", "haskell", "erlang", "elixir", "clojure",
];

pub const FRAMEWORKS: &[&str] = &[
    "react", "vue", "angular", "node.js", "express", "django", "flask", "spring", "laravel",
    "symfony", "rails", "asp.net", "jquery", "bootstrap", "tailwind", "next.js", "nuxt.js",
    "svelte", "ember", "backbone", "meteor", "gatsby", "webpack", "vite", "parcel",
];

pub const DATABASES: &[&str] = &[
    "mysql", "postgresql", "mongodb", "redis", "elasticsearch", "sqlite", "oracle",
    "sql server", "cassandra", "dynamodb", "firebase", "supabase", "neo4j", "influxdb",
];

pub const CLOUD_PLATFORMS: &[&str] = &[
    "aws", "azure", "google cloud", "gcp", "heroku", "netlify", "vercel", "digitalocean",
    "linode", "vultr", "cloudflare", "firebase", "supabase",
];

pub const TOOLS: &[&str] = &[
    "git", "docker", "kubernetes", "jenkins", "gitlab", "github", "jira", "confluence",
    "slack", "teams", "figma", "sketch", "photoshop", "illustrator", "indesign", "xd",
    "terraform", "ansible", "vagrant", "postman", "insomnia", "vs code", "intellij",
];

pub const METHODOLOGIES: &[&str] = &[
    "agile", "scrum", "kanban", "devops", "ci/cd", "tdd", "bdd", "lean", "waterfall",
    "design thinking", "user experience", "ux", "ui", "product management",
];

pub const SOFT_SKILLS: &[&str] = &[
    "communicatie", "teamwork", "leiderschap", "probleemoplossing", "creativiteit",
    "analytisch", "organisatie", "planning", "flexibiliteit", "aanpassingsvermogen",
    "initiatief", "zelfstandig", "samenwerking", "motivatie", "doorzettingsvermogen",
    "klantgericht", "resultaatgericht", "innovatief", "strategisch", "commercieel",
];

pub const LANGUAGES: &[&str] = &[
    "nederlands", "engels", "duits", "frans", "spaans", "italiaans", "portugees", "russisch",
    "chinees", "japans", "koreaans", "arabisch", "hindi", "turks",
];

/// Dutch context vocabulary that raises skill confidence. The lists mix
/// lemmas and inflected forms, so matching consults both token views.
pub const EXPERIENCE_INDICATORS: &[&str] = &[
    "ervaring", "jaar", "jaren", "gewerkt", "gebruikt", "ontwikkeld", "expert", "specialist",
];

pub const PROJECT_INDICATORS: &[&str] =
    &["project", "ontwikkeling", "implementatie", "gebouwd", "gemaakt"];

/// Hand-tuned scoring constants. There is no derivation behind these values;
/// they are kept as data so they can be adjusted without touching the scan.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub base: f64,
    pub experience_boost: f64,
    pub project_boost: f64,
    /// Tokens inspected on each side of the match.
    pub token_window: usize,
    /// Characters of original text kept on each side of the match.
    pub context_window: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base: 0.7,
            experience_boost: 0.2,
            project_boost: 0.1,
            token_window: 3,
            context_window: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillMatch {
    pub name: String,
    pub confidence: f64,
    pub start: usize,
    pub end: usize,
    pub context: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SkillReport {
    pub programming_languages: Vec<SkillMatch>,
    pub frameworks: Vec<SkillMatch>,
    pub databases: Vec<SkillMatch>,
    pub cloud_platforms: Vec<SkillMatch>,
    pub tools: Vec<SkillMatch>,
    pub methodologies: Vec<SkillMatch>,
    pub soft_skills: Vec<SkillMatch>,
    pub languages: Vec<SkillMatch>,
}

impl SkillReport {
    pub fn extract(doc: &ParsedDoc, text: &str, scoring: &ScoringConfig) -> Self {
        let [programming, frameworks, databases, cloud, tools, methodologies, soft, languages] =
            &*MATCHERS;
        Self {
            programming_languages: programming.scan(doc, text, scoring),
            frameworks: frameworks.scan(doc, text, scoring),
            databases: databases.scan(doc, text, scoring),
            cloud_platforms: cloud.scan(doc, text, scoring),
            tools: tools.scan(doc, text, scoring),
            methodologies: methodologies.scan(doc, text, scoring),
            soft_skills: soft.scan(doc, text, scoring),
            languages: languages.scan(doc, text, scoring),
        }
    }

    pub fn total(&self) -> usize {
        self.programming_languages.len()
            + self.frameworks.len()
            + self.databases.len()
            + self.cloud_platforms.len()
            + self.tools.len()
            + self.methodologies.len()
            + self.soft_skills.len()
            + self.languages.len()
    }
}

struct CategoryMatcher {
    ac: AhoCorasick,
    terms: &'static [&'static str],
}

static MATCHERS: LazyLock<[CategoryMatcher; 8]> = LazyLock::new(|| {
    [
        CategoryMatcher::new(PROGRAMMING_LANGUAGES),
        CategoryMatcher::new(FRAMEWORKS),
        CategoryMatcher::new(DATABASES),
        CategoryMatcher::new(CLOUD_PLATFORMS),
        CategoryMatcher::new(TOOLS),
        CategoryMatcher::new(METHODOLOGIES),
        CategoryMatcher::new(SOFT_SKILLS),
        CategoryMatcher::new(LANGUAGES),
    ]
});

impl CategoryMatcher {
    fn new(terms: &'static [&'static str]) -> Self {
        let ac = AhoCorasickBuilder::new()
            .ascii_case_insensitive(true)
            .build(terms)
            .expect("static skill term set");
        Self { ac, terms }
    }

    fn scan(&self, doc: &ParsedDoc, text: &str, scoring: &ScoringConfig) -> Vec<SkillMatch> {
        let mut found = Vec::new();
        // Overlapping search so that e.g. "sql" and "sql server" are both
        // seen; per-term dedup below keeps one entry each.
        for m in self.ac.find_overlapping_iter(text) {
            if !is_word_bounded(text, m.start(), m.end()) {
                continue;
            }
            let name = self.terms[m.pattern().as_usize()];
            found.push(SkillMatch {
                name: name.to_string(),
                confidence: score_match(doc, m.start(), scoring),
                start: m.start(),
                end: m.end(),
                context: context_snippet(text, m.start(), m.end(), scoring.context_window),
            });
        }
        dedupe_and_rank(found)
    }
}

fn is_word_char(c: Option<char>) -> bool {
    c.is_some_and(|ch| ch.is_alphanumeric() || ch == '_')
}

fn is_word_bounded(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !is_word_char(before) && !is_word_char(after)
}

fn score_match(doc: &ParsedDoc, match_start: usize, scoring: &ScoringConfig) -> f64 {
    let mut confidence = scoring.base;
    let Some(index) = doc.token_at(match_start) else {
        return confidence;
    };

    let from = index.saturating_sub(scoring.token_window);
    let to = (index + scoring.token_window + 1).min(doc.tokens.len());
    let window = &doc.tokens[from..to];

    if window.iter().any(|t| is_indicator(t, EXPERIENCE_INDICATORS)) {
        confidence += scoring.experience_boost;
    }
    if window.iter().any(|t| is_indicator(t, PROJECT_INDICATORS)) {
        confidence += scoring.project_boost;
    }
    confidence.min(1.0)
}

fn is_indicator(token: &Token, indicators: &[&str]) -> bool {
    indicators
        .iter()
        .any(|w| token.lemma.eq_ignore_ascii_case(w) || token.text.eq_ignore_ascii_case(w))
}

fn context_snippet(text: &str, start: usize, end: usize, window: usize) -> String {
    let head = &text[..start];
    let from = if window == 0 {
        start
    } else {
        head.char_indices()
            .rev()
            .nth(window - 1)
            .map(|(i, _)| i)
            .unwrap_or(0)
    };
    let tail = &text[end..];
    let to = end + tail.char_indices().nth(window).map(|(i, _)| i).unwrap_or(tail.len());
    text[from..to].trim().to_string()
}

fn dedupe_and_rank(found: Vec<SkillMatch>) -> Vec<SkillMatch> {
    let mut best: HashMap<String, SkillMatch> = HashMap::new();
    for m in found {
        match best.get(&m.name) {
            Some(existing) if existing.confidence >= m.confidence => {}
            _ => {
                best.insert(m.name.clone(), m);
            }
        }
    }
    let mut ranked: Vec<SkillMatch> = best.into_values().collect();
    ranked.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::doc::parse_whitespace;

    fn extract(text: &str) -> SkillReport {
        SkillReport::extract(&parse_whitespace(text), text, &ScoringConfig::default())
    }

    fn names(matches: &[SkillMatch]) -> Vec<&str> {
        matches.iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn finds_whole_word_terms_in_their_category() {
        let report = extract("Wij zoeken iemand met python en react kennis");
        assert_eq!(names(&report.programming_languages), vec!["python"]);
        assert_eq!(names(&report.frameworks), vec!["react"]);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let report = extract("Ervaring met Python en MySQL");
        assert_eq!(names(&report.programming_languages), vec!["python"]);
        assert_eq!(names(&report.databases), vec!["mysql"]);
    }

    #[test]
    fn does_not_match_terms_inside_longer_words() {
        // "java" must not fire inside "javascript"; "r" and "go" must not
        // fire inside ordinary Dutch words.
        let report = extract("Senior javascript ontwikkelaar gezocht");
        assert_eq!(names(&report.programming_languages), vec!["javascript"]);
    }

    #[test]
    fn matches_terms_with_symbols_at_text_end() {
        let report = extract("Veel ervaring met c++");
        assert!(names(&report.programming_languages).contains(&"c++"));
    }

    #[test]
    fn multi_word_terms_match_and_overlap_with_shorter_terms() {
        let report = extract("Beheer van sql server databases");
        let found = names(&report.databases);
        assert!(found.contains(&"sql server"));
        // "sql" is a separate dictionary entry and is itself word-bounded.
        assert!(names(&report.programming_languages).contains(&"sql"));
    }

    #[test]
    fn experience_indicator_raises_confidence() {
        let plain = extract("Wij gebruiken python op kantoor");
        let boosted = extract("Vijf jaar ervaring met python opgedaan");
        let base = plain.programming_languages[0].confidence;
        let raised = boosted.programming_languages[0].confidence;
        assert!(raised > base, "expected {raised} > {base}");
        assert!((base - 0.7).abs() < 1e-9);
        assert!((raised - 0.9).abs() < 1e-9);
    }

    #[test]
    fn indicator_outside_token_window_does_not_count() {
        let report = extract("ervaring met het bouwen van mooie python");
        assert!((report.programming_languages[0].confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn confidence_never_exceeds_one() {
        // Base + experience + project boost is exactly the clamp value.
        let report = extract("jaren ervaring met python project implementatie");
        let confidence = report.programming_languages[0].confidence;
        assert!((confidence - 1.0).abs() < 1e-9);
        for m in &report.programming_languages {
            assert!(m.confidence >= 0.0 && m.confidence <= 1.0);
        }
    }

    #[test]
    fn duplicate_terms_keep_the_highest_confidence() {
        let report = extract("python hier gebruikt en later nog eens python zonder context erbij");
        assert_eq!(report.programming_languages.len(), 1);
        // First occurrence sits next to "gebruikt", so the kept match is the
        // boosted one.
        assert!((report.programming_languages[0].confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn results_sort_by_confidence_then_name() {
        let report = extract("rust ervaring en ook python ervaring en verder scala");
        let langs = &report.programming_languages;
        assert!(langs.len() >= 3);
        for pair in langs.windows(2) {
            assert!(
                pair[0].confidence > pair[1].confidence
                    || (pair[0].confidence == pair[1].confidence && pair[0].name < pair[1].name)
            );
        }
    }

    #[test]
    fn context_snippet_stays_within_window_and_is_trimmed() {
        let text = format!("{} python {}", "a".repeat(80), "b".repeat(80));
        let report = extract(&text);
        let m = &report.programming_languages[0];
        assert!(m.context.contains("python"));
        assert!(m.context.len() <= 50 + "python".len() + 50);
        assert!(!m.context.starts_with(' ') && !m.context.ends_with(' '));
    }

    #[test]
    fn offsets_point_at_the_match_in_the_original_text() {
        let text = "Kennis van Docker vereist";
        let report = extract(text);
        let m = &report.tools[0];
        assert_eq!(&text[m.start..m.end], "Docker");
    }

    #[test]
    fn soft_skills_and_spoken_languages_are_found() {
        let report = extract("Goede communicatie in nederlands en engels");
        assert_eq!(names(&report.soft_skills), vec!["communicatie"]);
        assert_eq!(names(&report.languages), vec!["engels", "nederlands"]);
    }

    #[test]
    fn empty_text_yields_an_empty_report() {
        let report = extract("");
        assert_eq!(report.total(), 0);
    }
}
