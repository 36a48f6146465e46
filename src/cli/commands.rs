//! Command implementations: load a legacy dump, migrate, report.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde_json::json;

use crate::mapper::LocationMapper;
use crate::migrate::MigrationDriver;
use crate::store::{LegacyDump, LegacyStore, SplitStore, TargetStore};
use crate::types::{LegacyAddress, MigrateError, MigrateResult};

/// Load a legacy dump file into an in-memory store.
fn load_dump(path: &Path) -> MigrateResult<LegacyStore> {
    let reader = BufReader::new(File::open(path)?);
    let dump: LegacyDump = serde_json::from_reader(reader)?;
    Ok(LegacyStore::from_dump(dump))
}

/// Locate the course node of a dump.
///
/// Dumps are expected to hold one course; if several roots are present the
/// first one wins and the rest are reported.
fn course_address_of(store: &LegacyStore) -> MigrateResult<LegacyAddress> {
    let roots = store.course_roots();
    let mut roots = roots.into_iter();
    let first = roots.next().ok_or(MigrateError::DumpMissingCourse)?;
    for extra in roots {
        log::warn!("ignoring extra course root {} in dump", extra);
    }
    Ok(first)
}

/// Print summary information about a dump file.
pub fn cmd_info(path: &Path, json_output: bool) -> MigrateResult<()> {
    let reader = BufReader::new(File::open(path)?);
    let dump: LegacyDump = serde_json::from_reader(reader)?;

    let total = dump.nodes.len();
    let drafts = dump.nodes.iter().filter(|n| n.address.is_draft()).count();
    let courses: Vec<String> = dump
        .nodes
        .iter()
        .filter(|n| n.category == "course" && !n.address.is_draft())
        .map(|n| n.address.course_id())
        .collect();

    if json_output {
        let info = json!({
            "file": path.display().to_string(),
            "nodes": total,
            "published": total - drafts,
            "drafts": drafts,
            "courses": courses,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&info).unwrap_or_default()
        );
    } else {
        println!("File: {}", path.display());
        println!("Nodes: {} ({} published, {} draft)", total, total - drafts, drafts);
        for course in &courses {
            println!("Course: {}", course);
        }
    }
    Ok(())
}

/// Migrate the course contained in a dump file into a fresh versioned store.
pub fn cmd_migrate(
    path: &Path,
    user_id: &str,
    explicit_course_id: Option<&str>,
    emit_course: bool,
    json_output: bool,
) -> MigrateResult<()> {
    let store = load_dump(path)?;
    let course_address = course_address_of(&store)?;

    let published = store.published_view();
    let drafts = store.draft_view();
    let mut target = SplitStore::new();
    let mut mapper = LocationMapper::new();

    let report = MigrationDriver::new(&published, &drafts, &mut target, &mut mapper)
        .migrate_course(&course_address, user_id, explicit_course_id)?;

    if json_output {
        let mut out = serde_json::to_value(&report)?;
        if emit_course {
            out["course"] = emit_course_json(&target, &report.new_course_id)?;
        }
        println!(
            "{}",
            serde_json::to_string_pretty(&out).unwrap_or_default()
        );
    } else {
        println!("Migrated {} -> {}", course_address.course_id(), report.new_course_id);
        println!("Published nodes copied: {}", report.nodes_copied);
        println!("Dangling children pruned: {}", report.orphans_pruned);
        println!("Draft updates: {}", report.drafts_updated);
        println!("Draft-only blocks created: {}", report.drafts_created);
        println!("Parents spliced: {}", report.parents_spliced);
        if emit_course {
            println!(
                "{}",
                serde_json::to_string_pretty(&emit_course_json(&target, &report.new_course_id)?)
                    .unwrap_or_default()
            );
        }
    }
    Ok(())
}

/// Serialize a migrated course: its branch index plus both branch heads.
fn emit_course_json(
    target: &SplitStore,
    course_id: &str,
) -> MigrateResult<serde_json::Value> {
    let index = target.get_course_index(course_id)?;
    let mut branches = serde_json::Map::new();
    for (branch, version) in &index.branches {
        let structure = target
            .structure(version)
            .ok_or(MigrateError::VersionNotFound(*version))?;
        branches.insert(
            branch.as_str().to_string(),
            serde_json::to_value(structure)?,
        );
    }
    Ok(json!({
        "index": serde_json::to_value(&index)?,
        "structures": branches,
    }))
}
