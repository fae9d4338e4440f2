//! Token-overlap retriever over a YAML corpus of past conversation snippets.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context as _;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::core::ContextRetriever;
use super::types::{CorpusRecord, SearchResult};

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{L}\p{N}]+").expect("valid word regex"));

/// Shortest token that takes part in matching, in characters.
const MIN_TOKEN_CHARS: usize = 2;

fn tokenize(text: &str) -> HashSet<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS)
        .collect()
}

/// Ranks corpus records by the share of query tokens they contain.
#[derive(Debug, Clone)]
pub struct KeywordRetriever {
    records: Vec<(CorpusRecord, HashSet<String>)>,
    /// Maximum hits joined into the context.
    pub limit: usize,
    /// Minimum score a hit needs.
    pub score_threshold: f64,
}

impl KeywordRetriever {
    pub fn new(records: Vec<CorpusRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|r| {
                    let tokens = tokenize(&r.content);
                    (r, tokens)
                })
                .collect(),
            limit: 3,
            score_threshold: 0.3,
        }
    }

    /// Load a corpus file: a YAML list of `{id?, content}` records.
    pub fn from_yaml_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading retrieval corpus {}", path.display()))?;
        let records: Vec<CorpusRecord> = serde_yaml::from_str(&raw)
            .with_context(|| format!("parsing retrieval corpus {}", path.display()))?;
        log::debug!("Loaded {} retrieval records from {}", records.len(), path.display());
        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Best hits first; ties keep corpus order.
    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<SearchResult> = self
            .records
            .iter()
            .filter_map(|(record, tokens)| {
                let shared = query_tokens.intersection(tokens).count();
                let score = shared as f64 / query_tokens.len() as f64;
                (shared > 0 && score >= self.score_threshold).then(|| SearchResult {
                    id: record.id.clone(),
                    content: record.content.clone(),
                    score,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(self.limit);
        hits
    }
}

#[async_trait]
impl ContextRetriever for KeywordRetriever {
    async fn search_context(&self, query: &str) -> Result<String, anyhow::Error> {
        Ok(self
            .search(query)
            .into_iter()
            .map(|hit| hit.content)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn corpus() -> KeywordRetriever {
        KeywordRetriever::new(vec![
            CorpusRecord::with_id("a", "클라이밍 좋아하세요? 저도 주말마다 클라이밍 가요"),
            CorpusRecord::with_id("b", "요즘 러닝에 빠져서 매일 아침 뛰어요"),
            CorpusRecord::with_id("c", "Weekend climbing trips are the best"),
        ])
    }

    #[test]
    fn test_search_ranks_by_overlap() {
        let hits = corpus().search("저도 클라이밍 좋아하세요");
        assert_eq!(hits[0].id.as_deref(), Some("a"));
        assert!(hits.iter().all(|h| h.id.as_deref() != Some("b")));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let hits = corpus().search("CLIMBING weekend");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id.as_deref(), Some("c"));
        assert!((hits[0].score - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_no_overlap_gives_empty_context() {
        let retriever = corpus();
        assert!(retriever.search("ㅋㅋ").is_empty());
        assert_eq!(retriever.search_context("pizza").await.unwrap(), "");
    }

    #[test]
    fn test_limit_caps_hits() {
        let mut retriever = KeywordRetriever::new(
            (0..5).map(|i| CorpusRecord::new(format!("coffee chat {i}"))).collect(),
        );
        retriever.limit = 2;
        assert_eq!(retriever.search("coffee").len(), 2);
    }

    #[test]
    fn test_load_yaml_corpus() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "- id: one\n  content: 여행 좋아해요\n- content: 영화 보러 갈래요?").unwrap();
        let retriever = KeywordRetriever::from_yaml_file(file.path()).unwrap();
        assert_eq!(retriever.len(), 2);
        assert_eq!(retriever.search("여행")[0].id.as_deref(), Some("one"));
    }

    #[test]
    fn test_missing_corpus_is_an_error() {
        assert!(KeywordRetriever::from_yaml_file(Path::new("/no/such/corpus.yaml")).is_err());
    }
}
