//! Keyword rules that map a classifier label onto a [`SoundCategory`].
//!
//! The table is ordered: the first rule with a keyword contained in the label
//! (case-insensitive) decides the category. The metronome rule only takes part
//! when the caller says a metronome was running. Labels matching no rule fall
//! back to [`SoundCategory::Noise`].

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{DomainError, SoundCategory};

/// Category assigned to labels no rule matches.
pub const FALLBACK_CATEGORY: SoundCategory = SoundCategory::Noise;

const METRONOME_KEYWORDS: &[&str] = &["Click", "Clicking", "Tick", "Ticking", "Wood block", "Claves"];

const INSTRUMENT_KEYWORDS: &[&str] = &[
    "Musical instrument",
    "Piano",
    "Guitar",
    "Violin",
    "Cello",
    "Flute",
    "Drum",
    "Keyboard",
    "Organ",
    "Harp",
    "Accordion",
    "Harmonica",
    "Banjo",
    "Mandolin",
    "Ukulele",
    "Bass",
    "Synthesizer",
    "Electric piano",
    "Plucked string instrument",
    "Bowed string instrument",
    "Brass instrument",
    "Wind instrument",
    "Percussion",
];

const SPEECH_KEYWORDS: &[&str] = &["Speech", "Conversation", "Narration", "Singing", "Chant"];

const SILENCE_KEYWORDS: &[&str] = &["Silence", "White noise", "Pink noise", "Static"];

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct KeywordRule {
    pub category: SoundCategory,
    pub keywords: Vec<String>,
}

impl KeywordRule {
    pub fn new(category: SoundCategory, keywords: &[&str]) -> Self {
        Self {
            category,
            keywords: keywords.iter().map(|kw| kw.to_string()).collect(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct KeywordTableFile {
    rules: Vec<KeywordRule>,
}

#[derive(Clone, Debug)]
struct CompiledRule {
    category: SoundCategory,
    needles: Vec<String>,
}

impl CompiledRule {
    fn matches(&self, haystack: &str) -> bool {
        self.needles.iter().any(|needle| haystack.contains(needle.as_str()))
    }
}

fn compile(rules: &[KeywordRule]) -> Vec<CompiledRule> {
    rules
        .iter()
        .map(|rule| CompiledRule {
            category: rule.category,
            needles: rule.keywords.iter().map(|kw| kw.to_lowercase()).collect(),
        })
        .collect()
}

#[derive(Clone, Debug)]
pub struct KeywordTable {
    rules: Vec<KeywordRule>,
    compiled: Vec<CompiledRule>,
}

impl KeywordTable {
    pub fn new(rules: Vec<KeywordRule>) -> Result<Self, DomainError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if rule.category == FALLBACK_CATEGORY {
                return Err(DomainError::validation(format!(
                    "{} is the fallback category and cannot have a rule",
                    FALLBACK_CATEGORY
                )));
            }
            if !seen.insert(rule.category) {
                return Err(DomainError::validation(format!(
                    "duplicate rule for category {}",
                    rule.category
                )));
            }
            if rule.keywords.is_empty() {
                return Err(DomainError::validation(format!(
                    "rule for {} has no keywords",
                    rule.category
                )));
            }
            if rule.keywords.iter().any(|kw| kw.trim().is_empty()) {
                return Err(DomainError::validation(format!(
                    "rule for {} contains an empty keyword",
                    rule.category
                )));
            }
        }

        let compiled = compile(&rules);
        Ok(Self { rules, compiled })
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, DomainError> {
        let file: KeywordTableFile = serde_yaml::from_str(text)
            .map_err(|err| DomainError::Serialization(err.to_string()))?;
        Self::new(file.rules)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| DomainError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn to_yaml_string(&self) -> Result<String, DomainError> {
        let file = KeywordTableFile {
            rules: self.rules.clone(),
        };
        serde_yaml::to_string(&file).map_err(|err| DomainError::Serialization(err.to_string()))
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    /// Resolve a classifier label to exactly one category.
    pub fn classify(&self, label: &str, metronome_enabled: bool) -> SoundCategory {
        let haystack = label.to_lowercase();
        self.compiled
            .iter()
            .filter(|rule| metronome_enabled || rule.category != SoundCategory::Metronome)
            .find(|rule| rule.matches(&haystack))
            .map(|rule| rule.category)
            .unwrap_or(FALLBACK_CATEGORY)
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        let rules = vec![
            KeywordRule::new(SoundCategory::Metronome, METRONOME_KEYWORDS),
            KeywordRule::new(SoundCategory::Instrument, INSTRUMENT_KEYWORDS),
            KeywordRule::new(SoundCategory::Voice, SPEECH_KEYWORDS),
            KeywordRule::new(SoundCategory::Silence, SILENCE_KEYWORDS),
        ];
        let compiled = compile(&rules);
        Self { rules, compiled }
    }
}
