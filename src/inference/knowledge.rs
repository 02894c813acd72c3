//! Question and answer knowledge base shipped next to the model.
//!
//! The file is JSON Lines, one entry per line. Lookup goes through an
//! inverted index of lowercase word tokens; each query token that hits an
//! entry adds [`TOKEN_HIT_SCORE`] to it.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::inference::manifest::ModelAssets;
use crate::util::read_to_string_limited;

/// Score added per matching query token.
pub const TOKEN_HIT_SCORE: u32 = 2;

/// Default number of entries returned by a query.
pub const DEFAULT_QUERY_LIMIT: usize = 3;

/// Tokens this short are not indexed.
const MIN_TOKEN_CHARS: usize = 3;

/// One knowledge base entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeEntry {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Deserialize)]
struct RawEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    question: String,
    #[serde(default)]
    answer: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    category: Option<String>,
}

/// A scored query hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeHit {
    pub score: u32,
    #[serde(flatten)]
    pub entry: KnowledgeEntry,
}

/// In-memory knowledge base with its token index.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>,
    index: HashMap<String, BTreeSet<usize>>,
}

impl KnowledgeBase {
    /// Parse JSON Lines. Blank and malformed lines are skipped.
    pub fn from_jsonl(text: &str) -> Self {
        let mut kb = Self::default();
        for (line_num, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let raw: RawEntry = match serde_json::from_str(line) {
                Ok(raw) => raw,
                Err(e) => {
                    debug!("skipping knowledge line {}: {}", line_num + 1, e);
                    continue;
                }
            };
            let position = kb.entries.len();
            let entry = KnowledgeEntry {
                id: raw
                    .id
                    .filter(|id| !id.is_empty())
                    .unwrap_or_else(|| format!("id_{}", position)),
                question: raw.question,
                answer: raw.answer,
                tags: raw.tags,
                category: raw.category.filter(|c| !c.trim().is_empty()),
            };
            kb.index_entry(position, &entry);
            kb.entries.push(entry);
        }
        kb
    }

    /// Load a JSON Lines file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = read_to_string_limited(path)?;
        let kb = Self::from_jsonl(&text);
        debug!(path = %path.display(), entries = kb.len(), "loaded knowledge base");
        Ok(kb)
    }

    /// Load the knowledge base named by the model manifest.
    ///
    /// `None` when the manifest names no file, the file is missing or it
    /// holds no usable entries.
    pub fn from_assets(assets: &ModelAssets) -> Option<Self> {
        let path = Self::path_in(assets)?;
        if !path.is_file() {
            debug!(path = %path.display(), "knowledge base file not found");
            return None;
        }
        match Self::load(&path) {
            Ok(kb) if !kb.is_empty() => Some(kb),
            Ok(_) => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable knowledge base");
                None
            }
        }
    }

    /// Path of the manifest's knowledge file inside the model directory.
    ///
    /// Only a bare file name is accepted.
    pub fn path_in(assets: &ModelAssets) -> Option<PathBuf> {
        let name = assets
            .manifest
            .as_ref()?
            .knowledge
            .as_ref()?
            .merged_file
            .as_deref()?;
        let file_name = Path::new(name).file_name()?;
        if file_name != name {
            warn!(name, "knowledge file must be a plain file name");
            return None;
        }
        Some(assets.dir.join(file_name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    /// Up to `limit` entries matching `text`, best first.
    ///
    /// Equal scores keep file order.
    pub fn query(&self, text: &str, limit: usize) -> Vec<KnowledgeHit> {
        let mut scores: HashMap<usize, u32> = HashMap::new();
        for token in tokenize(text) {
            if let Some(hits) = self.index.get(&token) {
                for &position in hits {
                    *scores.entry(position).or_default() += TOKEN_HIT_SCORE;
                }
            }
        }

        let mut ranked: Vec<(usize, u32)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
            .into_iter()
            .take(limit)
            .map(|(position, score)| KnowledgeHit {
                score,
                entry: self.entries[position].clone(),
            })
            .collect()
    }

    fn index_entry(&mut self, position: usize, entry: &KnowledgeEntry) {
        let text = format!("{} {}", entry.question, entry.answer);
        let tags = entry
            .tags
            .iter()
            .map(|t| t.to_lowercase())
            .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS);
        for token in tokenize(&text).chain(tags) {
            self.index.entry(token).or_default().insert(position);
        }
    }
}

/// Lowercase space-separated words stripped to letters and digits.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(' ')
        .map(|raw| {
            raw.chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
}
