//! Skill catalog for skillbook.
//!
//! Discovers skill directories, parses descriptor frontmatter, validates
//! metadata, searches descriptor text, summarizes the repository, and copies
//! skills into an install location.

pub mod frontmatter;
pub mod indexer;
pub mod installer;
pub mod models;
pub mod search;
pub mod stats;
pub mod validation;

pub use frontmatter::{parse_frontmatter, split_frontmatter, Frontmatter, FrontmatterError};
pub use indexer::{IndexError, SkillIndexer};
pub use installer::{InstallError, InstallOutcome, InstallPlan, Installer};
pub use models::{
    CatalogStats, CategoryCount, CategoryGroup, Descriptor, Finding, SearchResult, SearchResults,
    Severity, SkillEntry, SkillIndex, SkillReport, SkillSummary, ValidationResult, UNCATEGORIZED,
};
pub use search::{SearchError, SearchService};
pub use stats::collect_stats;
pub use validation::{validate_entry, ValidationOptions, Validator};
