//! Repository summary counts.

use chrono::Utc;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::indexer::{IndexError, SkillIndexer};
use crate::models::{CatalogStats, CategoryCount};

/// Count descriptors and skills under the indexer's root.
///
/// `descriptor_files` counts every file with the descriptor name at any
/// depth below the root, hidden directories excluded. Category counts come
/// from each skill's frontmatter.
pub fn collect_stats(indexer: &SkillIndexer) -> Result<CatalogStats, IndexError> {
    let index = indexer.scan()?;

    let descriptor_files = WalkDir::new(indexer.root())
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("Skipping unreadable path while counting: {}", err);
                None
            }
        })
        .filter(|e| e.file_type().is_file() && e.file_name() == indexer.descriptor_file())
        .count();

    let categories = index
        .categories()
        .into_iter()
        .map(|group| CategoryCount {
            category: group.name,
            skills: group.skills.len(),
        })
        .collect();

    debug!(
        "Stats for {:?}: {} descriptor files, {} skill dirs",
        indexer.root(),
        descriptor_files,
        index.len()
    );

    Ok(CatalogStats {
        root: index.root.clone(),
        descriptor_files,
        skill_dirs: index.len(),
        skills_with_descriptor: index.with_descriptor().count(),
        categories,
        scanned_at: Utc::now(),
    })
}
