//! Core data models for the skill catalog.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::frontmatter::{Frontmatter, FrontmatterError};

/// Category used for skills whose frontmatter declares none.
pub const UNCATEGORIZED: &str = "uncategorized";

// ── Skill Entries ───────────────────────────────────────────────────────

/// What was found at a skill's descriptor path.
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptor {
    /// No descriptor file in the skill directory.
    Missing,
    /// The file exists but could not be read.
    Unreadable(String),
    /// Frontmatter could not be extracted.
    Invalid(FrontmatterError),
    /// Frontmatter was read.
    Parsed(Frontmatter),
}

/// One skill directory under the repository root.
#[derive(Debug, Clone)]
pub struct SkillEntry {
    /// Skill identifier: the directory name.
    pub id: String,

    /// Absolute or root-relative skill directory.
    pub dir: PathBuf,

    /// Expected descriptor path inside `dir`.
    pub descriptor_path: PathBuf,

    pub descriptor: Descriptor,
}

impl SkillEntry {
    /// Parsed frontmatter, if the descriptor was read successfully.
    pub fn frontmatter(&self) -> Option<&Frontmatter> {
        match &self.descriptor {
            Descriptor::Parsed(fm) => Some(fm),
            _ => None,
        }
    }

    /// Whether a descriptor file exists on disk.
    pub fn has_descriptor(&self) -> bool {
        !matches!(self.descriptor, Descriptor::Missing)
    }

    pub fn description(&self) -> Option<&str> {
        self.frontmatter().and_then(|fm| fm.description.as_deref())
    }

    /// Declared category, or [`UNCATEGORIZED`].
    pub fn category(&self) -> &str {
        self.frontmatter()
            .and_then(|fm| fm.category.as_deref())
            .unwrap_or(UNCATEGORIZED)
    }

    pub fn summary(&self) -> SkillSummary {
        let fm = self.frontmatter();
        SkillSummary {
            name: self.id.clone(),
            description: self.description().map(str::to_string),
            category: self.category().to_string(),
            tags: fm.map(|fm| fm.tags.clone()).unwrap_or_default(),
            metadata: fm.map(|fm| fm.extra.clone()).unwrap_or_default(),
        }
    }
}

/// Brief, serializable view of a skill for listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillSummary {
    /// Skill identifier.
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub category: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Frontmatter keys with no dedicated field.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

// ── Skill Index ─────────────────────────────────────────────────────────

/// All skills found under a root in one scan.
#[derive(Debug, Clone)]
pub struct SkillIndex {
    /// Repository root that was scanned.
    pub root: PathBuf,

    /// Skills in directory-name order.
    pub skills: Vec<SkillEntry>,
}

impl SkillIndex {
    pub fn new(root: PathBuf, skills: Vec<SkillEntry>) -> Self {
        Self { root, skills }
    }

    /// Find a skill by identifier.
    pub fn find(&self, id: &str) -> Option<&SkillEntry> {
        self.skills.iter().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Skills that have a descriptor file.
    pub fn with_descriptor(&self) -> impl Iterator<Item = &SkillEntry> {
        self.skills.iter().filter(|s| s.has_descriptor())
    }

    /// Group skills with a descriptor by category.
    ///
    /// Categories are sorted by name with [`UNCATEGORIZED`] last; skills keep
    /// index order within a category.
    pub fn categories(&self) -> Vec<CategoryGroup> {
        let mut grouped: BTreeMap<&str, Vec<SkillSummary>> = BTreeMap::new();
        for skill in self.with_descriptor() {
            grouped
                .entry(skill.category())
                .or_default()
                .push(skill.summary());
        }

        let uncategorized = grouped.remove(UNCATEGORIZED);
        let mut groups: Vec<CategoryGroup> = grouped
            .into_iter()
            .map(|(name, skills)| CategoryGroup {
                name: name.to_string(),
                skills,
            })
            .collect();

        if let Some(skills) = uncategorized {
            groups.push(CategoryGroup {
                name: UNCATEGORIZED.to_string(),
                skills,
            });
        }

        groups
    }
}

/// Skills sharing one category.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryGroup {
    pub name: String,
    pub skills: Vec<SkillSummary>,
}

// ── Search ──────────────────────────────────────────────────────────────

/// A single search hit.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// Skill identifier.
    pub skill: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Case-insensitive occurrences of the keyword in the descriptor.
    pub occurrences: usize,

    /// Excerpt around the first occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// Results from a search, in directory order.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub results: Vec<SearchResult>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }
}

// ── Validation ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One problem found in a skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// Validation outcome for a single skill.
#[derive(Debug, Clone, Serialize)]
pub struct SkillReport {
    pub skill: String,
    pub findings: Vec<Finding>,
}

impl SkillReport {
    pub fn new(skill: impl Into<String>) -> Self {
        Self {
            skill: skill.into(),
            findings: Vec::new(),
        }
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// Structurally valid: no errors, warnings allowed.
    pub fn is_valid(&self) -> bool {
        self.error_count() == 0
    }

    fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }
}

/// Aggregated validation result for a whole run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationResult {
    /// Per-skill reports in the order they were checked.
    pub reports: Vec<SkillReport>,
}

impl ValidationResult {
    pub fn push(&mut self, report: SkillReport) {
        self.reports.push(report);
    }

    pub fn skills_checked(&self) -> usize {
        self.reports.len()
    }

    pub fn error_count(&self) -> usize {
        self.reports.iter().map(SkillReport::error_count).sum()
    }

    pub fn warning_count(&self) -> usize {
        self.reports.iter().map(SkillReport::warning_count).sum()
    }

    /// Whether the run found no errors. Warnings do not count.
    pub fn is_valid(&self) -> bool {
        self.error_count() == 0
    }
}

// ── Stats ───────────────────────────────────────────────────────────────

/// Skill count for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub skills: usize,
}

/// Repository summary counts.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub root: PathBuf,

    /// Descriptor files anywhere under the root.
    pub descriptor_files: usize,

    /// Immediate skill directories.
    pub skill_dirs: usize,

    /// Skill directories that carry a descriptor.
    pub skills_with_descriptor: usize,

    pub categories: Vec<CategoryCount>,

    pub scanned_at: DateTime<Utc>,
}
