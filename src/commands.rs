//! Command handlers for the `skills` binary.
//!
//! Each handler writes to the given output so it can be driven from tests.

use anyhow::Result;
use serde_json::json;
use skillbook_catalog::{
    collect_stats, IndexError, Installer, SearchError, SearchService, Severity, SkillEntry,
    SkillIndexer, SkillReport, ValidationOptions, Validator,
};
use skillbook_core::{CommandError, SkillbookConfig};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Everything a command needs: configuration, the resolved indexer, and
/// the output mode.
pub struct Context {
    pub config: SkillbookConfig,
    pub indexer: SkillIndexer,
    pub json: bool,
}

impl Context {
    pub fn new(config: SkillbookConfig, root_override: Option<&Path>, json: bool) -> Self {
        let root = config.resolve_root(root_override);
        let indexer = SkillIndexer::from_config(root, &config.catalog);
        Self {
            config,
            indexer,
            json,
        }
    }

    fn lookup(&self, name: &str) -> Result<SkillEntry> {
        self.indexer.find(name).map_err(not_found)
    }
}

/// Turn "no such skill" into a [`CommandError::NotFound`]; pass the rest through.
fn not_found(err: IndexError) -> anyhow::Error {
    if err.is_not_found() {
        CommandError::NotFound(err.to_string()).into()
    } else {
        err.into()
    }
}

fn write_json(out: &mut dyn Write, value: &impl serde::Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// `list`: skills grouped by category.
pub fn list(ctx: &Context, out: &mut dyn Write) -> Result<()> {
    let index = ctx.indexer.scan()?;
    let groups = index.categories();

    if ctx.json {
        return write_json(out, &groups);
    }

    if groups.is_empty() {
        writeln!(out, "No skills found in {}.", index.root.display())?;
        return Ok(());
    }

    for (i, group) in groups.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        writeln!(out, "{} ({})", group.name, group.skills.len())?;
        for skill in &group.skills {
            write!(
                out,
                "  {:<28} {}",
                skill.name,
                skill.description.as_deref().unwrap_or("")
            )?;
            if !skill.tags.is_empty() {
                write!(out, " [{}]", skill.tags.join(", "))?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

/// `show <name>`: the descriptor's exact bytes.
pub fn show(ctx: &Context, name: &str, out: &mut dyn Write) -> Result<()> {
    let bytes = ctx.indexer.read_descriptor(name).map_err(not_found)?;
    out.write_all(&bytes)?;
    Ok(())
}

/// `search <keyword>`: skills whose descriptor mentions the keyword.
pub fn search(ctx: &Context, keyword: &str, out: &mut dyn Write) -> Result<()> {
    let results = match SearchService::new(&ctx.indexer).search(keyword) {
        Ok(results) => results,
        Err(SearchError::EmptyQuery) => {
            return Err(CommandError::Usage("search keyword must not be empty".into()).into())
        }
        Err(e) => return Err(e.into()),
    };

    if ctx.json {
        return write_json(out, &results);
    }

    if results.is_empty() {
        writeln!(out, "'{}' not found in any skill.", keyword)?;
        return Ok(());
    }

    writeln!(
        out,
        "Found {} skill(s) matching '{}':\n",
        results.len(),
        keyword
    )?;
    for result in &results.results {
        writeln!(
            out,
            "  {:<28} {}",
            result.skill,
            result.description.as_deref().unwrap_or("")
        )?;
        if let Some(snippet) = &result.snippet {
            writeln!(out, "    > {}", snippet)?;
        }
    }
    Ok(())
}

/// `stats`: descriptor and category counts.
pub fn stats(ctx: &Context, out: &mut dyn Write) -> Result<()> {
    let stats = collect_stats(&ctx.indexer)?;

    if ctx.json {
        return write_json(out, &stats);
    }

    writeln!(out, "Skills root:       {}", stats.root.display())?;
    writeln!(
        out,
        "Descriptor files:  {} ({})",
        stats.descriptor_files,
        ctx.indexer.descriptor_file()
    )?;
    writeln!(
        out,
        "Skill directories: {} ({} with descriptor)",
        stats.skill_dirs, stats.skills_with_descriptor
    )?;

    if !stats.categories.is_empty() {
        writeln!(out, "\nBy category:")?;
        for count in &stats.categories {
            writeln!(out, "  {:<20} {}", count.category, count.skills)?;
        }
    }
    Ok(())
}

fn render_report(report: &SkillReport, out: &mut dyn Write) -> Result<()> {
    let mark = if report.error_count() > 0 {
        "✗"
    } else if report.warning_count() > 0 {
        "⚠"
    } else {
        "✓"
    };

    if report.findings.is_empty() {
        writeln!(out, "  {} {}", mark, report.skill)?;
    } else {
        let messages: Vec<String> = report
            .findings
            .iter()
            .map(|f| match f.severity {
                Severity::Error => format!("error: {}", f.message),
                Severity::Warning => format!("warning: {}", f.message),
            })
            .collect();
        writeln!(out, "  {} {}: {}", mark, report.skill, messages.join("; "))?;
    }
    Ok(())
}

/// `validate`: check every skill, printing each result as it is produced.
///
/// Fails with [`CommandError::ValidationFailed`] when any error was found;
/// warnings alone succeed.
pub fn validate(ctx: &Context, strict: bool, out: &mut dyn Write) -> Result<()> {
    let options = ValidationOptions {
        descriptor_file: ctx.config.catalog.descriptor_file.clone(),
        description_prefix: ctx.config.catalog.description_prefix.clone(),
        strict,
    };
    let mut validator = Validator::new(options);

    if !ctx.json {
        writeln!(out, "Validating skills in {}", ctx.indexer.root().display())?;
    }

    for entry in ctx.indexer.entries()? {
        let report = validator.check(&entry);
        if !ctx.json {
            render_report(&report, out)?;
            out.flush()?;
        }
    }

    let result = validator.finish();
    let errors = result.error_count();
    let warnings = result.warning_count();

    if ctx.json {
        write_json(
            out,
            &json!({
                "root": ctx.indexer.root(),
                "skills_checked": result.skills_checked(),
                "errors": errors,
                "warnings": warnings,
                "reports": result.reports,
            }),
        )?;
    } else {
        writeln!(
            out,
            "\nChecked {} skill(s): {} error(s), {} warning(s)",
            result.skills_checked(),
            errors,
            warnings
        )?;
    }

    if errors > 0 {
        return Err(CommandError::ValidationFailed { errors }.into());
    }
    Ok(())
}

/// `install <name>`: copy the skill directory into the install root.
pub fn install(
    ctx: &Context,
    name: &str,
    dest: Option<PathBuf>,
    dry_run: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let entry = ctx.lookup(name)?;
    let dest_root = dest.unwrap_or_else(|| ctx.config.install.resolved_dir());
    let installer = Installer::new(dest_root);

    if dry_run {
        let plan = installer.plan(&entry)?;
        if ctx.json {
            return write_json(out, &plan);
        }
        writeln!(
            out,
            "Would install {} from {} to {}",
            plan.skill,
            plan.source.display(),
            plan.destination.display()
        )?;
        if plan.replaces_existing {
            writeln!(out, "The existing installation would be replaced.")?;
        }
        return Ok(());
    }

    let outcome = installer.install(&entry)?;
    if ctx.json {
        return write_json(out, &outcome);
    }

    if outcome.plan.replaces_existing {
        writeln!(
            out,
            "Replaced existing installation at {}",
            outcome.plan.destination.display()
        )?;
    }
    writeln!(
        out,
        "Installed {} to {} ({} file(s))",
        outcome.plan.skill,
        outcome.plan.destination.display(),
        outcome.files_copied
    )?;
    Ok(())
}

/// `test <name>`: placeholder; no testing is performed.
pub fn test(ctx: &Context, name: &str, out: &mut dyn Write) -> Result<()> {
    let entry = ctx.lookup(name)?;
    writeln!(
        out,
        "Skill testing is not implemented yet; '{}' was not tested.",
        entry.id
    )?;
    Ok(())
}
