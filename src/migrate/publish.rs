//! The publish phase: re-create the source published tree in the target.

use log::{debug, info};

use crate::mapper::LocationMapper;
use crate::store::{SourceStore, TargetStore};
use crate::types::{Branch, LegacyAddress, MigrateError, MigrateResult};

use super::project::project_fields;

/// Counters from one publish-copy run.
#[derive(Debug, Default)]
pub struct PublishSummary {
    /// Blocks created in the published structure (root excluded).
    pub nodes_copied: usize,
    /// Dangling child references removed by the cleanup pass.
    pub orphans_pruned: usize,
}

/// Copy every published node of a course into the target store.
///
/// All creates run in one continued-version session, so the whole published
/// tree lands in a single structure version. Enumeration is a wildcard over
/// the course rather than a descent from the root: legacy stores hold
/// orphaned islands (about pages, conditionals) that must come along too.
///
/// Afterwards the draft branch is aliased to the published head — drafts
/// initially mirror published — and the cleanup pass drops child references
/// to nodes that were never materialized (the legacy dangling-child defect
/// preserved by field projection).
pub fn copy_published<S: SourceStore, T: TargetStore>(
    source: &S,
    target: &mut T,
    mapper: &mut LocationMapper,
    new_course_id: &str,
    course_address: &LegacyAddress,
    old_course_id: &str,
    user_id: &str,
) -> MigrateResult<PublishSummary> {
    let items = source.get_items(course_address);
    if !items.iter().any(|n| n.address.same_node(course_address)) {
        return Err(MigrateError::SourceCourseNotFound(course_address.clone()));
    }
    // The course root must have been created by the driver already; a missing
    // index is an ordering error, not something to recover from.
    target.get_course_index(new_course_id).map_err(|e| match e {
        MigrateError::CourseNotFound(id) => MigrateError::TargetCourseNotFound(id),
        other => other,
    })?;

    let mut summary = PublishSummary::default();
    for node in &items {
        if node.address.same_node(course_address) {
            // Root block already written by create_course.
            continue;
        }
        let locator = mapper.translate(old_course_id, &node.address, true, true)?;
        let fields = project_fields(node, old_course_id, true, mapper)?;
        debug!("copying {} -> {}", node.address, locator);
        target.create_item(
            new_course_id,
            Branch::Published,
            &node.category,
            user_id,
            locator.usage_id,
            fields,
            true,
        )?;
        summary.nodes_copied += 1;
    }

    // Drafts start out as an alias of the published structure.
    let mut index = target.get_course_index(new_course_id)?;
    let published_head = *index.branches.get(&Branch::Published).ok_or_else(|| {
        MigrateError::BranchNotFound {
            course_id: new_course_id.to_string(),
            branch: Branch::Published.as_str().to_string(),
        }
    })?;
    index.branches.insert(Branch::Draft, published_head);
    target.update_course_index(index)?;

    summary.orphans_pruned = target.clean_children(new_course_id)?;
    info!(
        "published copy of {}: {} nodes, {} dangling references pruned",
        old_course_id, summary.nodes_copied, summary.orphans_pruned
    );
    Ok(summary)
}
