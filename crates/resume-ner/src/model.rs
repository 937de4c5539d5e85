//! Entity recognition over plain resume text.
//!
//! [`GazetteerModel`] is the default recognizer. It is built from a
//! `model.json` with three kinds of rules:
//!
//! - **gazetteers**: label → phrase list, matched case-insensitively at word
//!   boundaries;
//! - **patterns**: label → regular expressions, matched as written;
//! - **name**: an optional heading rule that tags the first short line of
//!   capitalized words as a person name.
//!
//! Candidates from all rules are pooled, overlaps are resolved longest-first
//! (then earliest start), and the survivors are returned in document order.

use crate::error::ModelError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name looked up inside a model directory.
pub const MODEL_FILE: &str = "model.json";

/// One tagged span. `text` is always a verbatim substring of the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub text: String,
    pub label: String,
}

/// Anything that can tag entities in a document.
pub trait EntityRecognizer: Send + Sync {
    /// Tag `text`. Empty input yields no spans.
    fn recognize(&self, text: &str) -> Vec<EntitySpan>;
}

// ── model.json ───────────────────────────────────────────────────────────────

/// On-disk shape of `model.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelSpec {
    #[serde(default)]
    pub gazetteers: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub patterns: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub name: Option<NameRule>,
}

/// Heading heuristic for the candidate's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRule {
    pub label: String,
    /// How many non-blank lines from the top are considered.
    #[serde(default = "default_leading_lines")]
    pub leading_lines: usize,
}

fn default_leading_lines() -> usize {
    3
}

// ── Compiled model ───────────────────────────────────────────────────────────

/// A capitalized word: initial uppercase letter, then letters or `.'-`.
static NAME_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\p{Lu}[\p{L}.'\-]*$").unwrap());

#[derive(Debug)]
struct Rule {
    label: String,
    regex: Regex,
    /// Gazetteer phrases, longest first, each anchored at the start of the
    /// haystack. Non-empty means matches must sit on word boundaries.
    phrases: Vec<Regex>,
}

impl Rule {
    fn spans(&self, text: &str) -> Vec<(usize, usize)> {
        if self.phrases.is_empty() {
            return self
                .regex
                .find_iter(text)
                .filter(|m| m.start() < m.end())
                .map(|m| (m.start(), m.end()))
                .collect();
        }

        let mut spans = Vec::new();
        let mut at = 0;
        while let Some(m) = self.regex.find_at(text, at) {
            let start = m.start();
            let end = if at_word_boundary(text, start, m.end()) {
                Some(m.end())
            } else {
                self.bounded_phrase_at(text, start)
            };
            at = match end {
                Some(end) => {
                    spans.push((start, end));
                    end
                }
                None => start + text[start..].chars().next().map_or(1, char::len_utf8),
            };
        }
        spans
    }

    /// The longest phrase that matches at `start` and ends on a boundary.
    fn bounded_phrase_at(&self, text: &str, start: usize) -> Option<usize> {
        let rest = &text[start..];
        self.phrases
            .iter()
            .filter_map(|p| p.find(rest))
            .map(|m| start + m.end())
            .find(|&end| end > start && at_word_boundary(text, start, end))
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    start: usize,
    end: usize,
    label: &'a str,
}

/// Dictionary + pattern recognizer compiled from a [`ModelSpec`].
#[derive(Debug)]
pub struct GazetteerModel {
    rules: Vec<Rule>,
    name: Option<NameRule>,
}

impl GazetteerModel {
    /// Load from a model directory (or a `model.json` path directly).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let file = resolve_model_file(path.as_ref());
        let raw = std::fs::read_to_string(&file).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ModelError::NotFound { path: file.clone() },
            _ => ModelError::Io {
                path: file.clone(),
                source: e,
            },
        })?;
        let spec: ModelSpec = serde_json::from_str(&raw).map_err(|e| ModelError::Parse {
            path: file.clone(),
            source: e,
        })?;
        let model = Self::from_spec(spec)?;
        info!(
            "Loaded entity model from {} ({} rules{})",
            file.display(),
            model.rules.len(),
            if model.name.is_some() { " + name heuristic" } else { "" }
        );
        Ok(model)
    }

    /// Compile an in-memory spec.
    pub fn from_spec(spec: ModelSpec) -> Result<Self, ModelError> {
        let mut rules = Vec::new();

        // Patterns first: for identical spans they win over gazetteer hits.
        for (label, patterns) in spec.patterns {
            let label = checked_label(label)?;
            for pattern in patterns {
                let regex = Regex::new(&pattern).map_err(|source| ModelError::InvalidPattern {
                    label: label.clone(),
                    source,
                })?;
                rules.push(Rule {
                    label: label.clone(),
                    regex,
                    phrases: Vec::new(),
                });
            }
        }

        for (label, phrases) in spec.gazetteers {
            let label = checked_label(label)?;
            let mut phrases: Vec<&str> = phrases
                .iter()
                .map(|p| p.trim())
                .filter(|p| !p.is_empty())
                .collect();
            if phrases.is_empty() {
                continue;
            }
            // Longest alternatives first so "JavaScript" beats "Java".
            phrases.sort_by(|a, b| {
                b.chars()
                    .count()
                    .cmp(&a.chars().count())
                    .then_with(|| a.cmp(b))
            });
            phrases.dedup();
            let escaped: Vec<String> = phrases.iter().map(|p| regex::escape(p)).collect();
            let compile = |pattern: String| {
                Regex::new(&pattern).map_err(|source| ModelError::InvalidPattern {
                    label: label.clone(),
                    source,
                })
            };
            let regex = compile(format!("(?i)(?:{})", escaped.join("|")))?;
            let anchored = escaped
                .iter()
                .map(|p| compile(format!("(?i)^(?:{p})")))
                .collect::<Result<Vec<_>, _>>()?;
            rules.push(Rule {
                label,
                regex,
                phrases: anchored,
            });
        }

        let name = match spec.name {
            Some(rule) => Some(NameRule {
                label: checked_label(rule.label)?,
                leading_lines: rule.leading_lines,
            }),
            None => None,
        };

        Ok(Self { rules, name })
    }

    /// Parse and compile a JSON model held in memory.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let spec: ModelSpec = serde_json::from_str(json).map_err(|e| ModelError::Parse {
            path: PathBuf::from("<inline>"),
            source: e,
        })?;
        Self::from_spec(spec)
    }

    fn name_candidate<'a>(&'a self, text: &str) -> Option<Candidate<'a>> {
        let rule = self.name.as_ref()?;
        let mut offset = 0;
        let mut seen = 0;
        for line in text.split_inclusive('\n') {
            let line_start = offset;
            offset += line.len();

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if seen == rule.leading_lines {
                break;
            }
            seen += 1;

            let words: Vec<&str> = trimmed.split_whitespace().collect();
            if (2..=4).contains(&words.len()) && words.iter().all(|w| NAME_WORD.is_match(w)) {
                let lead = line.len() - line.trim_start().len();
                let start = line_start + lead;
                return Some(Candidate {
                    start,
                    end: start + trimmed.len(),
                    label: &rule.label,
                });
            }
        }
        None
    }
}

impl EntityRecognizer for GazetteerModel {
    fn recognize(&self, text: &str) -> Vec<EntitySpan> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut candidates: Vec<Candidate<'_>> = Vec::new();
        candidates.extend(self.name_candidate(text));
        for rule in &self.rules {
            candidates.extend(rule.spans(text).into_iter().map(|(start, end)| Candidate {
                start,
                end,
                label: &rule.label,
            }));
        }

        let spans = resolve_overlaps(candidates);
        debug!("{} entities in {} chars", spans.len(), text.len());
        spans
            .into_iter()
            .map(|c| EntitySpan {
                text: text[c.start..c.end].to_string(),
                label: c.label.to_string(),
            })
            .collect()
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn resolve_model_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(MODEL_FILE)
    } else {
        path.to_path_buf()
    }
}

fn checked_label(label: String) -> Result<String, ModelError> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err(ModelError::EmptyLabel);
    }
    Ok(trimmed.to_string())
}

/// `\b` is not usable here: phrases like `C++` or `.NET` start or end on
/// non-word characters.
fn at_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let glued = |c: char| c.is_alphanumeric() || c == '_';
    let before = text[..start].chars().next_back().is_some_and(glued);
    let after = text[end..].chars().next().is_some_and(glued);
    !before && !after
}

/// Keep the longest candidates, earliest first on ties, dropping anything
/// that overlaps an accepted span. Returns accepted spans in document order.
fn resolve_overlaps(mut candidates: Vec<Candidate<'_>>) -> Vec<Candidate<'_>> {
    // Stable sort: equal spans keep rule order.
    candidates.sort_by(|a, b| {
        (b.end - b.start)
            .cmp(&(a.end - a.start))
            .then(a.start.cmp(&b.start))
    });

    let mut accepted: Vec<Candidate<'_>> = Vec::new();
    for c in candidates {
        if accepted.iter().all(|a| c.end <= a.start || c.start >= a.end) {
            accepted.push(c);
        }
    }
    accepted.sort_by_key(|c| c.start);
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> GazetteerModel {
        GazetteerModel::from_json(
            r#"{
                "gazetteers": {
                    "Skills": ["Rust", "C++", "Java", "JavaScript", "Machine Learning"],
                    "Companies worked at": ["Acme Corp"]
                },
                "patterns": {
                    "Email Address": ["[\\w.+-]+@[\\w-]+\\.[\\w.]+"]
                },
                "name": { "label": "Name" }
            }"#,
        )
        .unwrap()
    }

    fn labels(spans: &[EntitySpan]) -> Vec<(&str, &str)> {
        spans
            .iter()
            .map(|s| (s.text.as_str(), s.label.as_str()))
            .collect()
    }

    #[test]
    fn empty_text_has_no_entities() {
        assert!(model().recognize("").is_empty());
        assert!(model().recognize("   \n\t").is_empty());
    }

    #[test]
    fn tags_in_document_order() {
        let text = "Jane Q. Doe\njane.doe@example.com\nRust and c++ at ACME CORP";
        let spans = model().recognize(text);
        assert_eq!(
            labels(&spans),
            vec![
                ("Jane Q. Doe", "Name"),
                ("jane.doe@example.com", "Email Address"),
                ("Rust", "Skills"),
                ("c++", "Skills"),
                ("ACME CORP", "Companies worked at"),
            ]
        );
        for s in &spans {
            assert!(text.contains(&s.text));
        }
    }

    #[test]
    fn gazetteer_respects_word_boundaries() {
        let spans = model().recognize("Trusty crustacean, Javanese coffee");
        assert!(spans.is_empty(), "{spans:?}");
    }

    #[test]
    fn shorter_phrase_tried_when_longest_is_glued() {
        let m = GazetteerModel::from_json(
            r#"{ "gazetteers": { "Skills": ["Data", "Data Science", "SQL"] } }"#,
        )
        .unwrap();
        let spans = m.recognize("Data Sciences team, SQL");
        assert_eq!(labels(&spans), vec![("Data", "Skills"), ("SQL", "Skills")]);
    }

    #[test]
    fn longest_span_wins() {
        let spans = model().recognize("Expert in JavaScript and Java");
        assert_eq!(
            labels(&spans),
            vec![("JavaScript", "Skills"), ("Java", "Skills")]
        );
    }

    #[test]
    fn overlap_across_rules_keeps_longer() {
        let m = GazetteerModel::from_json(
            r#"{
                "gazetteers": { "Skills": ["Machine Learning"], "Designation": ["Machine Learning Engineer"] }
            }"#,
        )
        .unwrap();
        let spans = m.recognize("Senior Machine Learning Engineer");
        assert_eq!(
            labels(&spans),
            vec![("Machine Learning Engineer", "Designation")]
        );
    }

    #[test]
    fn name_rule_skips_long_or_lowercase_lines() {
        let m = model();
        let spans = m.recognize("curriculum vitae\nJohn Smith\n");
        assert_eq!(labels(&spans), vec![("John Smith", "Name")]);

        let spans = m.recognize("Senior Staff Software Engineer At Large\n");
        assert!(spans.iter().all(|s| s.label != "Name"));
    }

    #[test]
    fn name_rule_only_looks_at_leading_lines() {
        let m = GazetteerModel::from_json(
            r#"{ "name": { "label": "Name", "leading_lines": 1 } }"#,
        )
        .unwrap();
        assert!(m.recognize("resume\nJohn Smith").is_empty());
    }

    #[test]
    fn blank_label_is_rejected() {
        let err = GazetteerModel::from_json(r#"{ "gazetteers": { " ": ["x"] } }"#).unwrap_err();
        assert!(matches!(err, ModelError::EmptyLabel));
    }

    #[test]
    fn bad_pattern_is_rejected() {
        let err = GazetteerModel::from_json(r#"{ "patterns": { "Phone": ["("] } }"#).unwrap_err();
        assert!(matches!(err, ModelError::InvalidPattern { ref label, .. } if label == "Phone"));
    }

    #[test]
    fn load_reports_missing_model() {
        let dir = std::env::temp_dir().join("resume-ner-no-such-model");
        let err = GazetteerModel::load(&dir).unwrap_err();
        assert!(matches!(err, ModelError::NotFound { .. }));
    }

    #[test]
    fn bundled_model_loads() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("resume_ner_model");
        let m = GazetteerModel::load(dir).unwrap();
        assert!(!m.rules.is_empty());
        assert!(m.name.is_some());
    }
}
