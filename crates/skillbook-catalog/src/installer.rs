//! Copy a skill directory into an install location.
//!
//! Installing always replaces: an existing `<dest_root>/<name>` is removed
//! before the fresh copy is written. The copy is not transactional, so a
//! destination that overlaps the skill's own directory is refused up front.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::models::SkillEntry;

/// Where a skill would be copied, computed before touching the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallPlan {
    pub skill: String,
    pub source: PathBuf,
    pub destination: PathBuf,
    /// An installation already exists and will be replaced.
    pub replaces_existing: bool,
}

/// Result of a completed install.
#[derive(Debug, Clone, Serialize)]
pub struct InstallOutcome {
    #[serde(flatten)]
    pub plan: InstallPlan,
    pub files_copied: usize,
}

/// Installs skills under a destination root.
#[derive(Debug, Clone)]
pub struct Installer {
    dest_root: PathBuf,
}

impl Installer {
    pub fn new(dest_root: impl Into<PathBuf>) -> Self {
        Self {
            dest_root: dest_root.into(),
        }
    }

    /// Work out where `entry` would go without touching the filesystem.
    ///
    /// Fails when the destination is the skill directory itself, lies inside
    /// it, or contains it.
    pub fn plan(&self, entry: &SkillEntry) -> Result<InstallPlan, InstallError> {
        let destination = self.dest_root.join(&entry.id);

        let source_real = resolve_existing_prefix(&entry.dir);
        let destination_real = resolve_existing_prefix(&destination);
        if destination_real.starts_with(&source_real) || source_real.starts_with(&destination_real)
        {
            return Err(InstallError::OverlapsSource {
                skill_dir: entry.dir.clone(),
                destination,
            });
        }

        Ok(InstallPlan {
            skill: entry.id.clone(),
            source: entry.dir.clone(),
            replaces_existing: destination.exists(),
            destination,
        })
    }

    /// Copy the skill's directory tree, replacing any previous install.
    pub fn install(&self, entry: &SkillEntry) -> Result<InstallOutcome, InstallError> {
        if !entry.dir.is_dir() {
            return Err(InstallError::SourceMissing(entry.dir.clone()));
        }

        let plan = self.plan(entry)?;

        if plan.replaces_existing {
            debug!("Removing previous install at {:?}", plan.destination);
            let removed = if plan.destination.is_dir() {
                fs::remove_dir_all(&plan.destination)
            } else {
                fs::remove_file(&plan.destination)
            };
            removed.map_err(|e| InstallError::io(&plan.destination, e))?;
        }

        let files_copied = copy_dir_recursive(&plan.source, &plan.destination)?;
        info!(
            "Installed {} to {:?} ({} files)",
            plan.skill, plan.destination, files_copied
        );

        Ok(InstallOutcome { plan, files_copied })
    }
}

/// Canonicalize the longest existing prefix of `path` and re-append the rest.
///
/// Lets a destination that does not exist yet be compared with a real source
/// directory through symlinks and `..` components.
fn resolve_existing_prefix(path: &Path) -> PathBuf {
    let mut missing = Vec::new();
    let mut current = path;
    loop {
        if let Ok(real) = current.canonicalize() {
            return missing.iter().rev().fold(real, |acc, part| acc.join(part));
        }
        match (current.parent(), current.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                // A bare relative name has an empty parent; resolve it from `.`.
                current = if parent.as_os_str().is_empty() {
                    Path::new(".")
                } else {
                    parent
                };
            }
            _ => return path.to_path_buf(),
        }
    }
}

/// Recursively copy `src` into `dst`, returning the number of files copied.
fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<usize, InstallError> {
    fs::create_dir_all(dst).map_err(|e| InstallError::io(dst, e))?;

    let mut copied = 0;
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|_| InstallError::SourceMissing(entry.path().to_path_buf()))?;
        let target = dst.join(relative);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(|e| InstallError::io(&target, e))?;
        } else if file_type.is_file() || entry.path().is_file() {
            // Symlinked files are copied by content.
            fs::copy(entry.path(), &target).map_err(|e| InstallError::io(entry.path(), e))?;
            copied += 1;
        } else {
            warn!("Skipping {:?}: not a regular file", entry.path());
        }
    }

    Ok(copied)
}

/// Errors that can occur while installing a skill.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("source directory does not exist: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error(
        "install destination {} overlaps the skill directory {}",
        destination.display(),
        skill_dir.display()
    )]
    OverlapsSource {
        skill_dir: PathBuf,
        destination: PathBuf,
    },

    #[error("failed to copy {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to walk skill directory: {0}")]
    Walk(#[from] walkdir::Error),
}

impl InstallError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::SkillIndexer;
    use tempfile::TempDir;

    fn create_skill_source() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("forms");
        fs::create_dir_all(dir.join("references")).unwrap();
        fs::write(
            dir.join("SKILL.md"),
            "---\nname: forms\ndescription: Use when building forms\n---\n",
        )
        .unwrap();
        fs::write(dir.join("references").join("checklist.md"), "- [ ] labels\n").unwrap();
        temp_dir
    }

    #[test]
    fn test_install_copies_tree() {
        let source = create_skill_source();
        let dest = TempDir::new().unwrap();
        let entry = SkillIndexer::new(source.path()).find("forms").unwrap();

        let outcome = Installer::new(dest.path().join("skill"))
            .install(&entry)
            .unwrap();

        assert_eq!(outcome.files_copied, 2);
        assert!(!outcome.plan.replaces_existing);
        let installed = dest.path().join("skill").join("forms");
        assert_eq!(
            fs::read(installed.join("SKILL.md")).unwrap(),
            fs::read(source.path().join("forms").join("SKILL.md")).unwrap()
        );
        assert_eq!(
            fs::read_to_string(installed.join("references").join("checklist.md")).unwrap(),
            "- [ ] labels\n"
        );
    }

    #[test]
    fn test_reinstall_replaces_existing() {
        let source = create_skill_source();
        let dest = TempDir::new().unwrap();
        let entry = SkillIndexer::new(source.path()).find("forms").unwrap();
        let installer = Installer::new(dest.path());

        installer.install(&entry).unwrap();
        fs::write(dest.path().join("forms").join("stale.md"), "old").unwrap();

        let outcome = installer.install(&entry).unwrap();
        assert!(outcome.plan.replaces_existing);
        assert!(!dest.path().join("forms").join("stale.md").exists());
        assert_eq!(
            fs::read(dest.path().join("forms").join("SKILL.md")).unwrap(),
            fs::read(source.path().join("forms").join("SKILL.md")).unwrap()
        );
    }

    #[test]
    fn test_plan_does_not_touch_filesystem() {
        let source = create_skill_source();
        let dest = TempDir::new().unwrap();
        let entry = SkillIndexer::new(source.path()).find("forms").unwrap();

        let plan = Installer::new(dest.path().join("nested"))
            .plan(&entry)
            .unwrap();
        assert_eq!(plan.destination, dest.path().join("nested").join("forms"));
        assert!(!dest.path().join("nested").exists());
    }

    #[test]
    fn test_install_missing_source() {
        let source = create_skill_source();
        let dest = TempDir::new().unwrap();
        let mut entry = SkillIndexer::new(source.path()).find("forms").unwrap();
        entry.dir = source.path().join("vanished");

        let err = Installer::new(dest.path()).install(&entry).unwrap_err();
        assert!(matches!(err, InstallError::SourceMissing(_)));
    }

    #[test]
    fn test_install_into_own_root_is_refused() {
        let source = create_skill_source();
        let entry = SkillIndexer::new(source.path()).find("forms").unwrap();

        let err = Installer::new(source.path()).install(&entry).unwrap_err();
        assert!(matches!(err, InstallError::OverlapsSource { .. }));
        assert_eq!(
            fs::read_to_string(source.path().join("forms").join("SKILL.md")).unwrap(),
            "---\nname: forms\ndescription: Use when building forms\n---\n"
        );
        assert!(source
            .path()
            .join("forms")
            .join("references")
            .join("checklist.md")
            .is_file());
    }

    #[test]
    fn test_install_through_dotdot_path_is_refused() {
        let source = create_skill_source();
        let entry = SkillIndexer::new(source.path()).find("forms").unwrap();

        let roundabout = source.path().join("forms").join("..");
        assert!(matches!(
            Installer::new(roundabout).plan(&entry),
            Err(InstallError::OverlapsSource { .. })
        ));
    }

    #[test]
    fn test_install_inside_source_is_refused() {
        let source = create_skill_source();
        let entry = SkillIndexer::new(source.path()).find("forms").unwrap();

        let inside = source.path().join("forms").join("out");
        let err = Installer::new(&inside).install(&entry).unwrap_err();
        assert!(matches!(err, InstallError::OverlapsSource { .. }));
        assert!(!inside.exists());
    }

    #[test]
    fn test_install_over_parent_of_source_is_refused() {
        // Skills root nested as `<dest>/forms/catalog`, skill `forms`.
        let dest = TempDir::new().unwrap();
        let root = dest.path().join("forms").join("catalog");
        let dir = root.join("forms");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("SKILL.md"), "---\nname: forms\n---\n").unwrap();
        let entry = SkillIndexer::new(&root).find("forms").unwrap();

        let err = Installer::new(dest.path()).install(&entry).unwrap_err();
        assert!(matches!(err, InstallError::OverlapsSource { .. }));
        assert!(dir.join("SKILL.md").is_file());
    }
}
