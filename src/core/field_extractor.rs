use std::collections::BTreeMap;

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;

use super::models::{CandidateFields, NOT_FOUND};
use super::settings::RuntimeSettings;
use super::skills::SkillVocabulary;

const DEFAULT_EMAIL_PATTERN: &str = r"[\w.-]+@[\w.-]+\.\w+";
const DEFAULT_PHONE_PATTERN: &str = r"\+?\(?\d[\d \t().-]{7,}\d";
const DEFAULT_NAME_SKIP_PATTERN: &str = r"(?i)\d|@|www";
const TYPICAL_PHONE_DIGITS: usize = 10;

const GENERIC_HEADERS: [&str; 6] = [
    "resume",
    "résumé",
    "curriculum vitae",
    "cv",
    "biodata",
    "bio-data",
];

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(DEFAULT_EMAIL_PATTERN).unwrap());
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(DEFAULT_PHONE_PATTERN).unwrap());
static NAME_SKIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(DEFAULT_NAME_SKIP_PATTERN).unwrap());

/// Heuristic patterns used by the extractors. Any of them can be replaced
/// through settings without touching the pipeline.
#[derive(Debug, Clone)]
pub struct ExtractionPatterns {
    pub email: Regex,
    pub phone: Regex,
    pub name_skip: Regex,
    pub name_scan_lines: usize,
    pub phone_min_digits: usize,
    pub phone_max_digits: usize,
}

impl Default for ExtractionPatterns {
    fn default() -> Self {
        Self {
            email: EMAIL_RE.clone(),
            phone: PHONE_RE.clone(),
            name_skip: NAME_SKIP_RE.clone(),
            name_scan_lines: 10,
            phone_min_digits: 7,
            phone_max_digits: 15,
        }
    }
}

impl ExtractionPatterns {
    pub fn from_settings(settings: &RuntimeSettings) -> anyhow::Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            email: compile_or(settings.email_pattern.as_deref(), defaults.email, "email")?,
            phone: compile_or(settings.phone_pattern.as_deref(), defaults.phone, "phone")?,
            name_skip: compile_or(
                settings.name_skip_pattern.as_deref(),
                defaults.name_skip,
                "name skip",
            )?,
            name_scan_lines: settings.name_scan_lines.max(1),
            ..defaults
        })
    }
}

fn compile_or(pattern: Option<&str>, default: Regex, label: &str) -> anyhow::Result<Regex> {
    match pattern {
        Some(pattern) => {
            Regex::new(pattern).with_context(|| format!("invalid {label} pattern '{pattern}'"))
        }
        None => Ok(default),
    }
}

pub fn extract_email(text: &str, patterns: &ExtractionPatterns) -> String {
    patterns
        .email
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| NOT_FOUND.to_string())
}

pub fn extract_phone(text: &str, patterns: &ExtractionPatterns) -> String {
    patterns
        .phone
        .find_iter(text)
        .find_map(|m| fit_phone(m.as_str().trim(), patterns))
        .map(str::to_string)
        .unwrap_or_else(|| NOT_FOUND.to_string())
}

/// Accepts a match within the digit limits. A longer match, such as two numbers
/// on one line, is cut after the digit group whose running count is closest to
/// a ten-digit number.
fn fit_phone<'a>(candidate: &'a str, patterns: &ExtractionPatterns) -> Option<&'a str> {
    let allowed = patterns.phone_min_digits..=patterns.phone_max_digits;
    let digits = candidate.chars().filter(char::is_ascii_digit).count();
    if allowed.contains(&digits) {
        return Some(candidate);
    }
    if digits < patterns.phone_min_digits {
        return None;
    }

    let mut count = 0;
    let mut best: Option<(usize, usize)> = None;
    let mut chars = candidate.char_indices().peekable();
    while let Some((index, c)) = chars.next() {
        if !c.is_ascii_digit() {
            continue;
        }
        count += 1;
        let group_ends = chars.peek().map_or(true, |(_, next)| !next.is_ascii_digit());
        if !group_ends || !allowed.contains(&count) {
            continue;
        }

        let distance = count.abs_diff(TYPICAL_PHONE_DIGITS);
        if best.map_or(true, |(closest, _)| distance < closest) {
            best = Some((distance, index + c.len_utf8()));
        }
    }

    best.map(|(_, end)| &candidate[..end])
}

pub fn guess_name(text: &str, patterns: &ExtractionPatterns) -> String {
    for raw in text.trim().lines().take(patterns.name_scan_lines) {
        let line = raw.trim();
        if line.is_empty() || patterns.name_skip.is_match(line) || is_generic_header(line) {
            continue;
        }

        let words: Vec<&str> = line.split_whitespace().filter(|w| is_title_word(w)).collect();
        if (2..=4).contains(&words.len()) {
            return words.join(" ");
        }
    }

    NOT_FOUND.to_string()
}

/// Skill labels found in `text`, sorted by key and free of duplicates.
pub fn extract_skills(text: &str, vocabulary: &SkillVocabulary) -> Vec<String> {
    let haystack = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let mut matched = BTreeMap::new();
    for skill in vocabulary.iter() {
        if contains_phrase(&haystack, &skill.key) {
            matched.insert(skill.key.as_str(), skill.label.clone());
        }
    }

    matched.into_values().collect()
}

pub fn extract_candidate(
    text: &str,
    patterns: &ExtractionPatterns,
    vocabulary: &SkillVocabulary,
) -> CandidateFields {
    CandidateFields {
        name: guess_name(text, patterns),
        email: extract_email(text, patterns),
        phone: extract_phone(text, patterns),
        skills: extract_skills(text, vocabulary),
    }
}

fn contains_phrase(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }

    haystack.match_indices(needle).any(|(start, found)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + found.len()..].chars().next();
        !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
    })
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_title_word(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() && first.is_uppercase() => {
            chars.all(|c| c.is_alphabetic() && !c.is_uppercase())
        }
        _ => false,
    }
}

fn is_generic_header(line: &str) -> bool {
    let normalized = line.trim_end_matches(':').trim().to_lowercase();
    GENERIC_HEADERS.contains(&normalized.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> ExtractionPatterns {
        ExtractionPatterns::default()
    }

    #[test]
    fn extract_email_returns_first_match_or_sentinel() {
        let p = patterns();
        assert_eq!(
            extract_email("Contact me at john.doe@example.com or jd@other.org", &p),
            "john.doe@example.com"
        );
        assert_eq!(
            extract_email("Email: jane-smith@company.co.uk", &p),
            "jane-smith@company.co.uk"
        );
        assert_eq!(extract_email("No email here", &p), NOT_FOUND);
        assert_eq!(extract_email("", &p), NOT_FOUND);
    }

    #[test]
    fn extract_phone_accepts_common_separators() {
        let p = patterns();
        assert_eq!(extract_phone("Phone: +1 (555) 123-4567", &p), "+1 (555) 123-4567");
        assert_eq!(extract_phone("Mobile 98765 43210\nSkills", &p), "98765 43210");
        assert_eq!(extract_phone("call 555.123.4567 today", &p), "555.123.4567");
        assert_eq!(extract_phone("(555) 123-4567", &p), "(555) 123-4567");
    }

    #[test]
    fn extract_phone_rejects_short_or_absent_numbers() {
        let p = patterns();
        assert_eq!(extract_phone("Room 12345", &p), NOT_FOUND);
        assert_eq!(extract_phone("not a phone", &p), NOT_FOUND);
    }

    #[test]
    fn extract_phone_splits_numbers_sharing_a_line() {
        let p = ExtractionPatterns::default();
        assert_eq!(
            extract_phone("Tel 555 123 4567 555 987 6543", &p),
            "555 123 4567"
        );
        assert_eq!(
            extract_phone("+1 (555) 123-4567 / +1 (555) 987-6543", &p),
            "+1 (555) 123-4567"
        );
    }

    #[test]
    fn extract_phone_skips_unbroken_runs_over_fifteen_digits() {
        let p = ExtractionPatterns::default();
        assert_eq!(extract_phone("Account 1234567890123456", &p), NOT_FOUND);
        assert_eq!(
            extract_phone("Ref 12345678901234567890\nPhone 555-123-4567", &p),
            "555-123-4567"
        );
    }

    #[test]
    fn extract_phone_does_not_join_lines() {
        let p = patterns();
        assert_eq!(extract_phone("555-123-4567\n2019", &p), "555-123-4567");
    }

    #[test]
    fn guess_name_takes_title_cased_tokens() {
        let p = patterns();
        assert_eq!(
            guess_name("John Smith\njohn.smith@example.com", &p),
            "John Smith"
        );
        assert_eq!(guess_name("Name: Mary Ann Lee", &p), "Mary Ann Lee");
    }

    #[test]
    fn guess_name_skips_headers_contacts_and_digits() {
        let p = patterns();
        let text = "\n\nCURRICULUM VITAE\nResume:\nwww.example.com Portfolio Site\nAlan Turing\n";
        assert_eq!(guess_name(text, &p), "Alan Turing");

        let text = "Jane Doe 2024\nJane Doe jane@x.io\n";
        assert_eq!(guess_name(text, &p), NOT_FOUND);
    }

    #[test]
    fn guess_name_requires_two_to_four_tokens() {
        let p = patterns();
        assert_eq!(guess_name("Madonna\nSome Very Long Title Line Here", &p), NOT_FOUND);
        assert_eq!(guess_name("Madonna\nGrace Hopper", &p), "Grace Hopper");
    }

    #[test]
    fn guess_name_only_scans_the_configured_window() {
        let mut p = patterns();
        p.name_scan_lines = 2;
        assert_eq!(guess_name("summary\nexperience\nAda Lovelace", &p), NOT_FOUND);

        p.name_scan_lines = 3;
        assert_eq!(guess_name("summary\nexperience\nAda Lovelace", &p), "Ada Lovelace");
    }

    #[test]
    fn extract_skills_matches_words_and_phrases() {
        let vocabulary = SkillVocabulary::default();
        let text = "Skills: Python, sql, C++ and machine\nlearning. Also pythonic JavaScripting.";

        assert_eq!(
            extract_skills(text, &vocabulary),
            vec!["C++", "Machine Learning", "Python", "SQL"]
        );
    }

    #[test]
    fn extract_skills_is_sorted_deduplicated_and_idempotent() {
        let vocabulary = SkillVocabulary::default();
        let text = "SQL sql Sql HTML css Communication communication";

        let first = extract_skills(text, &vocabulary);
        let second = extract_skills(text, &vocabulary);

        assert_eq!(first, vec!["Communication", "CSS", "HTML", "SQL"]);
        assert_eq!(first, second);
        let mut sorted = first.clone();
        sorted.sort_by_key(|s| s.to_lowercase());
        sorted.dedup();
        assert_eq!(first, sorted);
    }

    #[test]
    fn extract_skills_returns_empty_when_nothing_matches() {
        let vocabulary = SkillVocabulary::default();
        assert!(extract_skills("Gardening and cooking", &vocabulary).is_empty());
        assert!(extract_skills("", &vocabulary).is_empty());
    }

    #[test]
    fn extract_candidate_handles_plain_resume() {
        let vocabulary = SkillVocabulary::default();
        let fields = extract_candidate(
            "John Smith\njohn.smith@example.com\nSkills: Python, SQL",
            &patterns(),
            &vocabulary,
        );

        assert_eq!(fields.name, "John Smith");
        assert_eq!(fields.email, "john.smith@example.com");
        assert_eq!(fields.phone, NOT_FOUND);
        assert!(fields.skills.contains(&"Python".to_string()));
        assert!(fields.skills.contains(&"SQL".to_string()));
    }

    #[test]
    fn extract_candidate_on_empty_text_yields_sentinels() {
        let fields = extract_candidate("", &patterns(), &SkillVocabulary::default());
        assert_eq!(fields.name, NOT_FOUND);
        assert_eq!(fields.email, NOT_FOUND);
        assert_eq!(fields.phone, NOT_FOUND);
        assert!(fields.skills.is_empty());
    }

    #[test]
    fn patterns_can_be_overridden_from_settings() {
        let settings = RuntimeSettings {
            email_pattern: Some(r"[a-z]+@corp\.example".to_string()),
            ..RuntimeSettings::default()
        };
        let p = ExtractionPatterns::from_settings(&settings).unwrap();

        assert_eq!(
            extract_email("a@b.com then dev@corp.example", &p),
            "dev@corp.example"
        );

        let settings = RuntimeSettings {
            phone_pattern: Some("([".to_string()),
            ..RuntimeSettings::default()
        };
        assert!(ExtractionPatterns::from_settings(&settings).is_err());
    }
}
