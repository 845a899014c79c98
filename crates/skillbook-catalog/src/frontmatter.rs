//! YAML frontmatter parsing for skill descriptors.
//!
//! A descriptor starts with a `---` line, carries a block of YAML, and closes
//! the block with another `---` line. Everything after is Markdown prose.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_yaml::Value;
use tracing::debug;

const MARKER: &str = "---";

/// Metadata read from a descriptor's frontmatter block.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Frontmatter {
    /// Declared skill name. Expected to match the directory name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// When the skill applies, e.g. "Use when reviewing a pull request".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Listing category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Keys this tool does not interpret, kept as written.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,

    /// Set when the block was not valid YAML and was read line by line.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub lenient: bool,
}

impl Frontmatter {
    /// Whether the description begins with `prefix`, compared literally.
    pub fn description_starts_with(&self, prefix: &str) -> bool {
        self.description
            .as_deref()
            .map(|d| d.starts_with(prefix))
            .unwrap_or(false)
    }

    fn set(&mut self, key: &str, value: Option<String>) {
        match key {
            "name" => self.name = value,
            "description" => self.description = value,
            "category" => self.category = value,
            _ => {}
        }
    }
}

/// Errors produced while reading a frontmatter block.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrontmatterError {
    #[error("missing opening '---' frontmatter marker")]
    MissingOpening,

    #[error("missing closing '---' frontmatter marker")]
    MissingClosing,

    #[error("frontmatter is not a key/value mapping")]
    NotAMapping,

    #[error("frontmatter field '{0}' must be a single value")]
    InvalidField(String),

    #[error("invalid frontmatter YAML: {0}")]
    InvalidYaml(String),
}

/// Split a descriptor into its frontmatter block and Markdown body.
///
/// A leading byte-order mark and blank lines before the opening marker are
/// tolerated. Marker lines may carry trailing whitespace.
pub fn split_frontmatter(content: &str) -> Result<(&str, &str), FrontmatterError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let content = content.trim_start_matches(['\r', '\n']);

    let mut lines = content.split_inclusive('\n');
    let first = lines.next().ok_or(FrontmatterError::MissingOpening)?;
    if first.trim_end() != MARKER {
        return Err(FrontmatterError::MissingOpening);
    }

    let start = first.len();
    let mut offset = start;
    for line in lines {
        if line.trim_end() == MARKER {
            let block = &content[start..offset];
            let body = &content[offset + line.len()..];
            return Ok((block, body));
        }
        offset += line.len();
    }

    Err(FrontmatterError::MissingClosing)
}

/// Parse the frontmatter of a descriptor.
pub fn parse_frontmatter(content: &str) -> Result<Frontmatter, FrontmatterError> {
    let (block, _) = split_frontmatter(content)?;
    parse_block(block)
}

fn parse_block(block: &str) -> Result<Frontmatter, FrontmatterError> {
    if block.trim().is_empty() {
        return Ok(Frontmatter::default());
    }

    match serde_yaml::from_str::<Value>(block) {
        Ok(Value::Null) => Ok(Frontmatter::default()),
        Ok(Value::Mapping(mapping)) => from_mapping(mapping),
        Ok(_) => Err(FrontmatterError::NotAMapping),
        Err(err) => {
            debug!("Frontmatter is not valid YAML ({}), reading line by line", err);
            let fm = parse_lines(block);
            if fm == Frontmatter::default() {
                Err(FrontmatterError::InvalidYaml(err.to_string()))
            } else {
                Ok(Frontmatter {
                    lenient: true,
                    ..fm
                })
            }
        }
    }
}

fn from_mapping(mapping: serde_yaml::Mapping) -> Result<Frontmatter, FrontmatterError> {
    let mut fm = Frontmatter::default();

    for (key, value) in mapping {
        let key = match key {
            Value::String(s) => s,
            other => scalar_to_string(&other).unwrap_or_default(),
        };

        match key.as_str() {
            "name" | "description" | "category" => {
                if matches!(value, Value::Sequence(_) | Value::Mapping(_)) {
                    return Err(FrontmatterError::InvalidField(key));
                }
                fm.set(&key, non_empty(scalar_to_string(&value)));
            }
            "tags" => fm.tags = tags_from_value(&value),
            _ => {
                fm.extra.insert(key, value);
            }
        }
    }

    Ok(fm)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

fn tags_from_value(value: &Value) -> Vec<String> {
    match value {
        Value::Sequence(items) => items
            .iter()
            .filter_map(scalar_to_string)
            .filter_map(|t| non_empty(Some(t)))
            .collect(),
        other => scalar_to_string(other)
            .map(|s| split_tag_list(&s))
            .unwrap_or_default(),
    }
}

/// Line-oriented fallback for blocks a YAML parser rejects, most often an
/// unquoted description containing `: `. Only top-level `key: value` lines
/// are read.
fn parse_lines(block: &str) -> Frontmatter {
    let mut fm = Frontmatter::default();

    for line in block.lines() {
        if line.starts_with([' ', '\t']) || line.trim_start().starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() || key.contains(char::is_whitespace) {
            continue;
        }

        let value = unquote(value);
        match key {
            "name" | "description" | "category" => fm.set(key, non_empty(Some(value))),
            "tags" => fm.tags = split_tag_list(&value),
            _ => {
                fm.extra.insert(key.to_string(), Value::String(value));
            }
        }
    }

    fm
}

/// Parse `[a, b]` or `a, b`.
fn split_tag_list(value: &str) -> Vec<String> {
    value
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(unquote)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Remove surrounding quotes from a YAML value.
fn unquote(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
