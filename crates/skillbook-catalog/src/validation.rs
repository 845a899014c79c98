//! Structural checks for skill descriptors.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::models::{Descriptor, Finding, SkillEntry, SkillReport, ValidationResult};

/// Prefix descriptions are expected to start with unless configured otherwise.
pub const DEFAULT_DESCRIPTION_PREFIX: &str = "Use when";

/// Knobs for a validation run.
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Descriptor file name, used in messages.
    pub descriptor_file: String,
    /// Literal prefix each description should start with.
    pub description_prefix: String,
    /// Add naming and consistency warnings on top of the required checks.
    pub strict: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            descriptor_file: crate::indexer::DEFAULT_DESCRIPTOR_FILE.to_string(),
            description_prefix: DEFAULT_DESCRIPTION_PREFIX.to_string(),
            strict: false,
        }
    }
}

/// Apply the required checks to one skill.
///
/// Stops at the first error. A description that does not start with the
/// expected prefix is a warning, so the skill still counts as valid.
pub fn validate_entry(entry: &SkillEntry, options: &ValidationOptions) -> SkillReport {
    let mut report = SkillReport::new(entry.id.clone());

    let fm = match &entry.descriptor {
        Descriptor::Missing => {
            report
                .findings
                .push(Finding::error(format!("missing {}", options.descriptor_file)));
            return report;
        }
        Descriptor::Unreadable(reason) => {
            report.findings.push(Finding::error(format!(
                "cannot read {}: {}",
                options.descriptor_file, reason
            )));
            return report;
        }
        Descriptor::Invalid(err) => {
            report.findings.push(Finding::error(err.to_string()));
            return report;
        }
        Descriptor::Parsed(fm) => fm,
    };

    if fm.name.is_none() {
        report.findings.push(Finding::error("missing 'name' field"));
        return report;
    }

    if fm.description.is_none() {
        report
            .findings
            .push(Finding::error("missing 'description' field"));
        return report;
    }

    if !fm.description_starts_with(&options.description_prefix) {
        report.findings.push(Finding::warning(format!(
            "description should start with \"{}\"",
            options.description_prefix
        )));
    }

    report
}

/// Runs checks skill by skill, remembering what strict mode needs across
/// skills.
#[derive(Debug, Default)]
pub struct Validator {
    options: ValidationOptions,
    seen_names: HashSet<String>,
    result: ValidationResult,
}

impl Validator {
    pub fn new(options: ValidationOptions) -> Self {
        Self {
            options,
            seen_names: HashSet::new(),
            result: ValidationResult::default(),
        }
    }

    /// Check one skill and record the report.
    pub fn check(&mut self, entry: &SkillEntry) -> SkillReport {
        let mut report = validate_entry(entry, &self.options);

        if self.options.strict && report.is_valid() {
            if let Some(fm) = entry.frontmatter() {
                let name = fm.name.as_deref().unwrap_or_default();

                if name != entry.id {
                    report.findings.push(Finding::warning(format!(
                        "name '{}' does not match directory '{}'",
                        name, entry.id
                    )));
                }
                if name_pattern().is_some_and(|re| !re.is_match(name)) {
                    report.findings.push(Finding::warning(format!(
                        "name '{}' should be lowercase letters, digits, and single hyphens",
                        name
                    )));
                }
                if fm.lenient {
                    report.findings.push(Finding::warning(
                        "frontmatter is not valid YAML (quote values containing ': ')",
                    ));
                }
                if !self.seen_names.insert(name.to_string()) {
                    report
                        .findings
                        .push(Finding::warning(format!("duplicate skill name '{}'", name)));
                }
            }
        }

        debug!(
            "Validated {}: {} error(s), {} warning(s)",
            report.skill,
            report.error_count(),
            report.warning_count()
        );

        self.result.push(report.clone());
        report
    }

    /// Finish the run and return the aggregated result.
    pub fn finish(self) -> ValidationResult {
        self.result
    }
}

fn name_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").ok())
        .as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter::{Frontmatter, FrontmatterError};
    use crate::indexer::SkillIndexer;
    use crate::models::Severity;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn entry(id: &str, descriptor: Descriptor) -> SkillEntry {
        SkillEntry {
            id: id.to_string(),
            dir: PathBuf::from(id),
            descriptor_path: PathBuf::from(id).join("SKILL.md"),
            descriptor,
        }
    }

    fn parsed(name: Option<&str>, description: Option<&str>) -> Descriptor {
        Descriptor::Parsed(Frontmatter {
            name: name.map(str::to_string),
            description: description.map(str::to_string),
            ..Default::default()
        })
    }

    #[test]
    fn test_valid_skill_has_no_findings() {
        let report = validate_entry(
            &entry("foo", parsed(Some("foo"), Some("Use when testing example validation"))),
            &ValidationOptions::default(),
        );
        assert!(report.findings.is_empty());
    }

    #[test]
    fn test_missing_descriptor_is_single_error() {
        let report = validate_entry(
            &entry("foo", Descriptor::Missing),
            &ValidationOptions::default(),
        );
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 0);
        assert_eq!(report.findings[0].message, "missing SKILL.md");
    }

    #[test]
    fn test_prefix_mismatch_is_warning() {
        let report = validate_entry(
            &entry("foo", parsed(Some("foo"), Some("Helps with testing"))),
            &ValidationOptions::default(),
        );
        assert_eq!(report.error_count(), 0);
        assert_eq!(report.warning_count(), 1);
        assert!(report.is_valid());
    }

    #[test]
    fn test_prefix_is_case_sensitive() {
        let report = validate_entry(
            &entry("foo", parsed(Some("foo"), Some("use when lowercase"))),
            &ValidationOptions::default(),
        );
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn test_missing_name_stops_checks() {
        let report = validate_entry(
            &entry("foo", parsed(None, None)),
            &ValidationOptions::default(),
        );
        assert_eq!(report.findings, vec![Finding::error("missing 'name' field")]);
    }

    #[test]
    fn test_missing_description() {
        let report = validate_entry(
            &entry("foo", parsed(Some("foo"), None)),
            &ValidationOptions::default(),
        );
        assert_eq!(
            report.findings,
            vec![Finding::error("missing 'description' field")]
        );
    }

    #[test]
    fn test_invalid_frontmatter_is_error() {
        let report = validate_entry(
            &entry("foo", Descriptor::Invalid(FrontmatterError::MissingOpening)),
            &ValidationOptions::default(),
        );
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.findings[0].severity, Severity::Error);
    }

    #[test]
    fn test_custom_prefix() {
        let options = ValidationOptions {
            description_prefix: "Invoke for".into(),
            ..Default::default()
        };
        let report = validate_entry(
            &entry("foo", parsed(Some("foo"), Some("Invoke for audits"))),
            &options,
        );
        assert!(report.findings.is_empty());
    }

    #[test]
    fn test_strict_mode_warnings() {
        let options = ValidationOptions {
            strict: true,
            ..Default::default()
        };
        let mut validator = Validator::new(options);

        let ok = validator.check(&entry("good-skill", parsed(Some("good-skill"), Some("Use when"))));
        assert!(ok.findings.is_empty());

        let mismatch = validator.check(&entry("dir", parsed(Some("Other_Name"), Some("Use when"))));
        assert_eq!(mismatch.warning_count(), 2);

        let dup = validator.check(&entry("copy", parsed(Some("good-skill"), Some("Use when"))));
        assert!(dup
            .findings
            .iter()
            .any(|f| f.message == "duplicate skill name 'good-skill'"));

        let broken = validator.check(&entry("broken", Descriptor::Missing));
        assert_eq!(broken.findings.len(), 1);

        let result = validator.finish();
        assert_eq!(result.skills_checked(), 4);
        assert_eq!(result.error_count(), 1);
    }

    #[test]
    fn test_default_mode_ignores_name_mismatch() {
        let mut validator = Validator::new(ValidationOptions::default());
        let report = validator.check(&entry("dir", parsed(Some("other"), Some("Use when x"))));
        assert!(report.findings.is_empty());
    }

    #[test]
    fn test_validate_repository_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let write = |name: &str, content: &str| {
            let dir = root.join(name);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("SKILL.md"), content).unwrap();
        };
        write(
            "foo",
            "---\nname: foo\ndescription: Use when testing example validation\n---\n",
        );
        write("bar", "---\nname: bar\ndescription: Does things\n---\n");
        write("baz", "---\ndescription: Use when nameless\n---\n");
        fs::create_dir_all(root.join("qux")).unwrap();

        let mut validator = Validator::new(ValidationOptions::default());
        for entry in SkillIndexer::new(root).entries().unwrap() {
            validator.check(&entry);
        }
        let result = validator.finish();

        let order: Vec<&str> = result.reports.iter().map(|r| r.skill.as_str()).collect();
        assert_eq!(order, vec!["bar", "baz", "foo", "qux"]);
        assert_eq!(result.error_count(), 2);
        assert_eq!(result.warning_count(), 1);

        let foo = &result.reports[2];
        assert_eq!(foo.error_count(), 0);
        assert_eq!(foo.warning_count(), 0);
        assert!(!result.is_valid());
    }

    #[test]
    fn test_non_utf8_body_is_valid() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("cafe");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("SKILL.md"),
            b"---\nname: cafe\ndescription: Use when ordering coffee\n---\n\nCaf\xe9 au lait\n",
        )
        .unwrap();

        let entry = SkillIndexer::new(temp_dir.path()).find("cafe").unwrap();
        let report = validate_entry(&entry, &ValidationOptions::default());
        assert!(report.findings.is_empty(), "{:?}", report.findings);
    }
}
