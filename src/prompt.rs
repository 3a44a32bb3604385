//! Prompt Catalog
//!
//! Instruction text for sentence generation. Each batch gets the generation rules,
//! parameterized by its sentence count, plus one topic with example sentences. Topics
//! rotate deterministically by batch index so a run is reproducible.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const COUNT_PLACEHOLDER: &str = "{count}";
const TOPIC_PLACEHOLDER: &str = "{topic}";
const EXAMPLES_PLACEHOLDER: &str = "{examples}";

/// Default instruction template. `{count}`, `{topic}` and `{examples}` are substituted per batch.
pub const DEFAULT_TEMPLATE: &str = "\
Generate exactly {count} Hebrew sentences. Follow every rule below.

1. Alphabet and punctuation
- Use only Hebrew letters (U+05D0-U+05EA), spaces, and the marks . , ? !
- No digits, Latin letters, niqqud, emojis or other symbols.

2. Length
- Roughly a quarter short (5-8 words), a third medium (9-14 words), the rest long (15-22 words).
- Vary how sentences open: adverbs, conjunctions and prepositions, not only the subject.

3. Style and syntax
- Mix everyday speech, formal register, emotional and sensory sentences.
- Mix statements, questions, exclamations and requests.
- Vary word order and use subordinate clauses.

4. Repetition
- Do not reuse openings, verbs or phrases often. A proper name may appear at most twice.

5. Output format
- Exactly one sentence per line.
- No numbering, quotes, explanations, translations or metadata.
- Output only the Hebrew sentences.

TOPIC: {topic}

Examples:
{examples}";

/// A prompt topic with a handful of example sentences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub topic: String,
    #[serde(default)]
    pub examples: Vec<String>,
}

impl Topic {
    fn new(topic: &str, examples: &[&str]) -> Self {
        Self {
            topic: topic.to_string(),
            examples: examples.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// Prompt catalog configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSettings {
    /// JSON file holding an array of `{ "topic": ..., "examples": [...] }`.
    /// The built-in catalog is used when unset.
    #[serde(default)]
    pub topics_file: Option<PathBuf>,

    /// Plain-text instruction template replacing the built-in one.
    #[serde(default)]
    pub template_file: Option<PathBuf>,

    /// Offset applied to topic rotation.
    #[serde(default)]
    pub topic_seed: usize,
}

/// Topics plus template used to build per-batch instructions
#[derive(Debug, Clone)]
pub struct PromptCatalog {
    template: String,
    topics: Vec<Topic>,
    seed: usize,
}

impl PromptCatalog {
    /// Catalog with the built-in template and topics.
    pub fn builtin() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            topics: builtin_topics(),
            seed: 0,
        }
    }

    pub fn new(template: String, topics: Vec<Topic>) -> Result<Self, ApiError> {
        if topics.is_empty() {
            return Err(ApiError::PromptError(
                "Topic catalog must contain at least one topic".to_string(),
            ));
        }
        if !template.contains(COUNT_PLACEHOLDER) {
            return Err(ApiError::PromptError(format!(
                "Instruction template must contain the {} placeholder",
                COUNT_PLACEHOLDER
            )));
        }
        Ok(Self {
            template,
            topics,
            seed: 0,
        })
    }

    /// Load the catalog described by `settings`, falling back to built-ins for unset parts.
    pub fn load(settings: &PromptSettings) -> Result<Self, ApiError> {
        let template = match &settings.template_file {
            Some(path) => std::fs::read_to_string(path).map_err(|e| {
                ApiError::PromptError(format!(
                    "Failed to read template {}: {}",
                    path.display(),
                    e
                ))
            })?,
            None => DEFAULT_TEMPLATE.to_string(),
        };
        let topics = match &settings.topics_file {
            Some(path) => load_topics(path)?,
            None => builtin_topics(),
        };
        Ok(Self::new(template, topics)?.with_seed(settings.topic_seed))
    }

    pub fn with_seed(mut self, seed: usize) -> Self {
        self.seed = seed;
        self
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    /// Topic used for the given batch.
    pub fn topic_for(&self, batch_index: usize) -> &Topic {
        let slot = self.seed.wrapping_add(batch_index) % self.topics.len();
        &self.topics[slot]
    }

    /// Instruction text for one batch.
    pub fn instructions(&self, batch_index: usize, count: usize) -> String {
        let topic = self.topic_for(batch_index);
        self.template
            .replace(COUNT_PLACEHOLDER, &count.to_string())
            .replace(TOPIC_PLACEHOLDER, &topic.topic)
            .replace(EXAMPLES_PLACEHOLDER, &topic.examples.join("\n"))
    }

    /// User message restating how many sentences are wanted.
    pub fn user_hint(count: usize) -> String {
        if count == 1 {
            "Write 1 sentence.".to_string()
        } else {
            format!("Write {} sentences.", count)
        }
    }
}

impl Default for PromptCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn load_topics(path: &Path) -> Result<Vec<Topic>, ApiError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        ApiError::PromptError(format!("Failed to read topics {}: {}", path.display(), e))
    })?;
    let topics: Vec<Topic> = serde_json::from_str(&raw).map_err(|e| {
        ApiError::PromptError(format!("Failed to parse topics {}: {}", path.display(), e))
    })?;
    let topics: Vec<Topic> = topics
        .into_iter()
        .filter(|t| !t.topic.trim().is_empty())
        .collect();
    if topics.is_empty() {
        return Err(ApiError::PromptError(format!(
            "Topics file {} contains no usable topics",
            path.display()
        )));
    }
    Ok(topics)
}

fn builtin_topics() -> Vec<Topic> {
    vec![
        Topic::new(
            "בית ומשפחה",
            &[
                "אמא הכינה מרק חם לכל המשפחה.",
                "מתי אבא חוזר מהעבודה?",
            ],
        ),
        Topic::new(
            "לימודים ובית ספר",
            &[
                "המורה ביקשה מאיתנו לקרוא פרק נוסף עד מחר.",
                "למה המבחן נדחה שוב?",
            ],
        ),
        Topic::new(
            "עבודה וטכנולוגיה",
            &[
                "המחשב החדש עובד מהר יותר ממה שציפיתי.",
                "הפגישה הוזזה לשעה מאוחרת יותר.",
            ],
        ),
        Topic::new(
            "טיולים ותחבורה",
            &[
                "נסענו ברכבת לאורך החוף בשקט.",
                "האוטובוס האחרון כבר יצא!",
            ],
        ),
        Topic::new(
            "אוכל ובישול",
            &[
                "הריח של הלחם הטרי מילא את כל המטבח.",
                "כמה מלח צריך לשים ברוטב?",
            ],
        ),
        Topic::new(
            "טבע וחוץ",
            &[
                "פתאום התחיל לרדת גשם חזק בשדה.",
                "הציפורים שרו מעל העצים בבוקר.",
            ],
        ),
    ]
}
