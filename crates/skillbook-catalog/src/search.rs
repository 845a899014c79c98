//! Keyword search and snippet extraction for skills.

use std::fs;

use tracing::debug;

use crate::frontmatter::parse_frontmatter;
use crate::indexer::{IndexError, SkillIndexer};
use crate::models::{SearchResult, SearchResults};

// ── Snippet Extraction ──────────────────────────────────────────────────

/// Extract a snippet around the first case-insensitive match of `term`.
///
/// Returns a portion of the content centered around the match, with
/// ellipsis indicators if truncated. The snippet is cut from `content`
/// itself, so it keeps the original casing even where lowercasing changes
/// byte lengths.
pub fn extract_snippet(content: &str, term: &str, context_chars: usize) -> Option<String> {
    let (match_start, match_end) = find_ignore_case(content, term)?;

    let start = floor_char_boundary(content, match_start.saturating_sub(context_chars));
    let end = ceil_char_boundary(content, (match_end + context_chars).min(content.len()));

    // Snap to word boundaries.
    let start = find_word_start(content, start);
    let end = find_word_end(content, end);

    let mut snippet = String::new();
    if start > 0 {
        snippet.push_str("...");
    }
    snippet.push_str(content[start..end].trim());
    if end < content.len() {
        snippet.push_str("...");
    }

    // Clean up whitespace.
    let snippet = snippet
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    Some(snippet)
}

/// Byte range in `content` of the first case-insensitive match of `term`.
///
/// Matching runs on the lowercased text; the range is mapped back to whole
/// characters of the original.
fn find_ignore_case(content: &str, term: &str) -> Option<(usize, usize)> {
    let term_lower = term.to_lowercase();
    if term_lower.is_empty() {
        return Some((0, 0));
    }

    // origin[i] is the offset in `content` of the char that produced byte i
    // of `lowered`.
    let mut lowered = String::with_capacity(content.len());
    let mut origin = Vec::with_capacity(content.len());
    for (offset, ch) in content.char_indices() {
        for lower in ch.to_lowercase() {
            lowered.push(lower);
            origin.resize(lowered.len(), offset);
        }
    }

    let pos = lowered.find(&term_lower)?;
    let start = origin[pos];
    let last = origin[pos + term_lower.len() - 1];
    let end = last + content[last..].chars().next().map_or(0, char::len_utf8);
    Some((start, end))
}

fn floor_char_boundary(s: &str, mut pos: usize) -> usize {
    while pos > 0 && !s.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

fn ceil_char_boundary(s: &str, mut pos: usize) -> usize {
    while pos < s.len() && !s.is_char_boundary(pos) {
        pos += 1;
    }
    pos
}

/// Find the start of a word boundary.
fn find_word_start(content: &str, pos: usize) -> usize {
    if pos == 0 {
        return 0;
    }
    let bytes = content.as_bytes();
    let mut start = pos;
    while start > 0 && !bytes[start - 1].is_ascii_whitespace() {
        start -= 1;
    }
    start
}

/// Find the end of a word boundary.
fn find_word_end(content: &str, pos: usize) -> usize {
    if pos >= content.len() {
        return content.len();
    }
    let bytes = content.as_bytes();
    let mut end = pos;
    while end < bytes.len() && !bytes[end].is_ascii_whitespace() {
        end += 1;
    }
    end
}

// ── Search Service ──────────────────────────────────────────────────────

/// Full-text keyword search over skill descriptors.
pub struct SearchService<'a> {
    indexer: &'a SkillIndexer,
}

impl<'a> SearchService<'a> {
    /// Default context size for snippets.
    const DEFAULT_SNIPPET_CONTEXT: usize = 40;

    pub fn new(indexer: &'a SkillIndexer) -> Self {
        Self { indexer }
    }

    /// Find every skill whose descriptor contains `query`, ignoring case.
    ///
    /// The whole file is searched, not only the frontmatter. Results follow
    /// directory order. Skills without a readable descriptor never match.
    pub fn search(&self, query: &str) -> Result<SearchResults, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let query_lower = query.to_lowercase();
        let mut results = Vec::new();

        for dir in self.indexer.skill_dirs()? {
            let path = self.indexer.descriptor_path(&dir);
            let Ok(bytes) = fs::read(&path) else {
                continue;
            };
            let content = String::from_utf8_lossy(&bytes);

            let occurrences = content.to_lowercase().matches(&query_lower).count();
            if occurrences == 0 {
                continue;
            }

            let skill = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let (description, tags) = match parse_frontmatter(&content) {
                Ok(fm) => (fm.description, fm.tags),
                Err(_) => (None, Vec::new()),
            };
            let snippet = extract_snippet(&content, query, Self::DEFAULT_SNIPPET_CONTEXT);

            results.push(SearchResult {
                skill,
                description,
                tags,
                occurrences,
                snippet,
            });
        }

        debug!("Search '{}' found {} results", query, results.len());

        Ok(SearchResults {
            query: query.to_string(),
            results,
        })
    }
}

/// Errors that can occur during search.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search keyword must not be empty")]
    EmptyQuery,

    #[error(transparent)]
    Index(#[from] IndexError),
}
