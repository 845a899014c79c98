//! Skill directory discovery and descriptor loading.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use skillbook_core::CatalogConfig;
use tracing::{debug, warn};

use crate::frontmatter::parse_frontmatter;
use crate::models::{Descriptor, SkillEntry, SkillIndex};

/// Default descriptor file name.
pub const DEFAULT_DESCRIPTOR_FILE: &str = "SKILL.md";

/// Discovers skills under a repository root.
///
/// Every non-hidden immediate subdirectory of the root is a skill, named by
/// its directory. Nothing is cached; each call reads the filesystem.
#[derive(Debug, Clone)]
pub struct SkillIndexer {
    root: PathBuf,
    descriptor_file: String,
}

impl SkillIndexer {
    /// Create an indexer using the default descriptor name.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            descriptor_file: DEFAULT_DESCRIPTOR_FILE.to_string(),
        }
    }

    pub fn from_config(root: impl Into<PathBuf>, config: &CatalogConfig) -> Self {
        Self::new(root).with_descriptor_file(config.descriptor_file.clone())
    }

    /// Use a different descriptor file name.
    pub fn with_descriptor_file(mut self, name: impl Into<String>) -> Self {
        self.descriptor_file = name.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn descriptor_file(&self) -> &str {
        &self.descriptor_file
    }

    /// List skill directories, sorted by name.
    pub fn skill_dirs(&self) -> Result<Vec<PathBuf>, IndexError> {
        if !self.root.is_dir() {
            return Err(IndexError::RootNotFound(self.root.clone()));
        }

        let read_dir = fs::read_dir(&self.root).map_err(|e| IndexError::io(&self.root, e))?;

        let mut dirs = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| IndexError::io(&self.root, e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            dirs.push(path);
        }

        dirs.sort();
        debug!("Found {} skill directories under {:?}", dirs.len(), self.root);
        Ok(dirs)
    }

    /// Load skills one at a time in directory order.
    pub fn entries(&self) -> Result<impl Iterator<Item = SkillEntry> + '_, IndexError> {
        let dirs = self.skill_dirs()?;
        Ok(dirs.into_iter().map(move |dir| self.load_entry(&dir)))
    }

    /// Scan every skill under the root.
    pub fn scan(&self) -> Result<SkillIndex, IndexError> {
        let skills: Vec<SkillEntry> = self.entries()?.collect();
        Ok(SkillIndex::new(self.root.clone(), skills))
    }

    /// Descriptor path for a skill directory.
    pub fn descriptor_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.descriptor_file)
    }

    /// Read and parse the skill in `dir`.
    ///
    /// Invalid UTF-8 is replaced rather than rejected, the same way search
    /// reads descriptors, so a stray byte in the prose does not hide the
    /// frontmatter.
    pub fn load_entry(&self, dir: &Path) -> SkillEntry {
        let id = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let descriptor_path = self.descriptor_path(dir);

        let descriptor = if !descriptor_path.is_file() {
            Descriptor::Missing
        } else {
            match fs::read(&descriptor_path) {
                Ok(bytes) => match parse_frontmatter(&String::from_utf8_lossy(&bytes)) {
                    Ok(fm) => {
                        if fm.lenient {
                            debug!("{}: frontmatter is not valid YAML, read line by line", id);
                        }
                        Descriptor::Parsed(fm)
                    }
                    Err(e) => {
                        debug!("{}: {}", id, e);
                        Descriptor::Invalid(e)
                    }
                },
                Err(e) => {
                    warn!("Failed to read {:?}: {}", descriptor_path, e);
                    Descriptor::Unreadable(e.to_string())
                }
            }
        };

        SkillEntry {
            id,
            dir: dir.to_path_buf(),
            descriptor_path,
            descriptor,
        }
    }

    /// Resolve a skill identifier to its directory.
    ///
    /// Identifiers are plain directory names; anything that could point
    /// outside the root is treated as unknown.
    pub fn skill_dir(&self, name: &str) -> Result<PathBuf, IndexError> {
        if !is_plain_name(name) {
            return Err(IndexError::SkillNotFound(name.to_string()));
        }
        let dir = self.root.join(name);
        if !dir.is_dir() {
            return Err(IndexError::SkillNotFound(name.to_string()));
        }
        Ok(dir)
    }

    /// Look up a skill that must have a descriptor file.
    pub fn find(&self, name: &str) -> Result<SkillEntry, IndexError> {
        let dir = self.skill_dir(name)?;
        let entry = self.load_entry(&dir);
        if !entry.has_descriptor() {
            return Err(IndexError::MissingDescriptor {
                name: name.to_string(),
                file: self.descriptor_file.clone(),
            });
        }
        Ok(entry)
    }

    /// Raw bytes of a skill's descriptor file.
    pub fn read_descriptor(&self, name: &str) -> Result<Vec<u8>, IndexError> {
        let entry = self.find(name)?;
        fs::read(&entry.descriptor_path).map_err(|e| IndexError::io(&entry.descriptor_path, e))
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.starts_with('.')
}

/// Errors that can occur while discovering skills.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("skills root not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("skill not found: {0}")]
    SkillNotFound(String),

    #[error("skill '{name}' has no {file}")]
    MissingDescriptor { name: String, file: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl IndexError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether this error means the requested skill does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            IndexError::SkillNotFound(_) | IndexError::MissingDescriptor { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_skill(root: &Path, name: &str, content: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("SKILL.md"), content).unwrap();
    }

    fn setup() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        write_skill(
            temp_dir.path(),
            "zeta",
            "---\nname: zeta\ndescription: Use when last\n---\n",
        );
        write_skill(
            temp_dir.path(),
            "alpha",
            "---\nname: alpha\ndescription: Use when first\ncategory: docs\n---\n",
        );
        fs::create_dir_all(temp_dir.path().join("empty")).unwrap();
        fs::create_dir_all(temp_dir.path().join(".git")).unwrap();
        fs::write(temp_dir.path().join("README.md"), "# Skills").unwrap();
        temp_dir
    }

    #[test]
    fn test_skill_dirs_sorted_and_filtered() {
        let temp_dir = setup();
        let indexer = SkillIndexer::new(temp_dir.path());
        let names: Vec<String> = indexer
            .skill_dirs()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["alpha", "empty", "zeta"]);
    }

    #[test]
    fn test_scan() {
        let temp_dir = setup();
        let index = SkillIndexer::new(temp_dir.path()).scan().unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.find("alpha").unwrap().category(), "docs");
        assert_eq!(index.find("empty").unwrap().descriptor, Descriptor::Missing);
        assert_eq!(index.with_descriptor().count(), 2);
    }

    #[test]
    fn test_invalid_descriptor_recorded() {
        let temp_dir = TempDir::new().unwrap();
        write_skill(temp_dir.path(), "plain", "# Just markdown\n");
        let index = SkillIndexer::new(temp_dir.path()).scan().unwrap();
        assert!(matches!(
            index.find("plain").unwrap().descriptor,
            Descriptor::Invalid(_)
        ));
    }

    #[test]
    fn test_non_utf8_body_still_parses() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("cafe");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("SKILL.md"),
            b"---\nname: cafe\ndescription: Use when ordering\n---\n\nCaf\xe9 au lait\n",
        )
        .unwrap();

        let entry = SkillIndexer::new(temp_dir.path()).find("cafe").unwrap();
        assert_eq!(entry.description(), Some("Use when ordering"));
    }

    #[test]
    fn test_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let indexer = SkillIndexer::new(temp_dir.path().join("nope"));
        assert!(matches!(
            indexer.skill_dirs(),
            Err(IndexError::RootNotFound(_))
        ));
    }

    #[test]
    fn test_find_and_read_descriptor() {
        let temp_dir = setup();
        let indexer = SkillIndexer::new(temp_dir.path());

        let bytes = indexer.read_descriptor("alpha").unwrap();
        assert_eq!(
            bytes,
            b"---\nname: alpha\ndescription: Use when first\ncategory: docs\n---\n"
        );

        let err = indexer.find("missing").unwrap_err();
        assert!(err.is_not_found());

        let err = indexer.find("empty").unwrap_err();
        assert!(matches!(err, IndexError::MissingDescriptor { .. }));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_path_like_names_rejected() {
        let temp_dir = setup();
        let indexer = SkillIndexer::new(temp_dir.path().join("alpha"));
        for name in ["..", "../zeta", ".git", "", "a/b"] {
            assert!(
                matches!(indexer.skill_dir(name), Err(IndexError::SkillNotFound(_))),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_custom_descriptor_file() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("custom");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("README.md"), "---\nname: custom\n---\n").unwrap();

        let indexer = SkillIndexer::new(temp_dir.path()).with_descriptor_file("README.md");
        let entry = indexer.find("custom").unwrap();
        assert_eq!(
            entry.frontmatter().unwrap().name.as_deref(),
            Some("custom")
        );
    }
}
