//! The draft phase: merge draft-variant nodes into the migrated course.

use log::{debug, info};

use crate::mapper::LocationMapper;
use crate::store::{Block, SourceNode, SourceStore, TargetStore};
use crate::types::{apply_diff, Branch, LegacyAddress, MigrateResult, UsageId};

use super::project::project_fields;

/// Counters from one draft-merge run.
#[derive(Debug, Default)]
pub struct DraftSummary {
    /// Blocks that existed in published and were updated with draft fields.
    pub drafts_updated: usize,
    /// Draft-only blocks created fresh on the draft branch.
    pub drafts_created: usize,
    /// Parent child-lists that received a spliced-in draft-only block.
    pub parents_spliced: usize,
}

/// Merge every draft-variant node of the source course into the target.
///
/// Runs after the publish copy, when the draft branch still aliases the
/// published structure. Nodes with a published counterpart get a field-level
/// update (case A); draft-only nodes are created and then spliced into each
/// of their legacy parents (case B). The work is split into two passes so
/// that every draft block exists before any re-parenting happens — a splice
/// touches parent blocks that may themselves be draft-only.
///
/// Each update or splice cuts its own structure version on the draft branch.
/// That is accepted, not optimized.
pub fn merge_drafts<S: SourceStore, T: TargetStore>(
    source: &S,
    target: &mut T,
    mapper: &mut LocationMapper,
    new_course_id: &str,
    course_address: &LegacyAddress,
    old_course_id: &str,
    user_id: &str,
) -> MigrateResult<DraftSummary> {
    let mut summary = DraftSummary::default();
    let drafts: Vec<SourceNode> = source
        .get_items(course_address)
        .into_iter()
        .filter(|n| n.address.is_draft())
        .collect();

    // Pass 1: make every draft node's content exist on the draft branch.
    let mut created: Vec<SourceNode> = Vec::new();
    for node in drafts {
        let locator = mapper.translate(old_course_id, &node.address, false, true)?;
        if target.has_item(&locator) {
            // Case A: the published copy made this block; the draft is a new
            // version of it. Fields no longer explicitly set revert, fields
            // set on the draft win.
            let mut block = target.get_item(&locator)?;
            let projected = project_fields(&node, old_course_id, false, mapper)?;
            let diff = apply_diff(&projected, &block.fields);
            debug!(
                "updating {} from {} ({} fields dropped)",
                locator,
                node.address,
                diff.removed.len()
            );
            block.fields = diff.fields;
            target.update_item(&block, user_id)?;
            summary.drafts_updated += 1;
        } else {
            // Case B: no published counterpart; create fresh on draft.
            let fields = project_fields(&node, old_course_id, false, mapper)?;
            debug!("creating draft-only {} as {}", node.address, locator);
            target.create_item(
                new_course_id,
                Branch::Draft,
                &node.category,
                user_id,
                locator.usage_id,
                fields,
                true,
            )?;
            summary.drafts_created += 1;
            created.push(node);
        }
    }

    // Pass 2: splice each created block into its legacy parents.
    for node in &created {
        let locator = mapper.translate(old_course_id, &node.address, false, false)?;
        for parent_address in source.get_parent_addresses(&node.address) {
            let old_parent = source.get_item(&parent_address)?;
            let parent_locator = mapper.translate(old_course_id, &parent_address, false, true)?;
            let mut new_parent = target.get_item(&parent_locator)?;
            splice_child(
                &mut new_parent,
                &old_parent,
                node,
                &locator.usage_id,
                old_course_id,
                mapper,
            )?;
            target.update_item(&new_parent, user_id)?;
            summary.parents_spliced += 1;
        }
    }

    info!(
        "draft merge of {}: {} updated, {} created, {} parents spliced",
        old_course_id, summary.drafts_updated, summary.drafts_created, summary.parents_spliced
    );
    Ok(summary)
}

/// Insert `usage_id` into `new_parent`'s child list at the position implied
/// by the legacy sibling order.
///
/// Sibling-anchored positioning: walk the legacy parent's children in order
/// up to the node being inserted. Each preceding sibling that translates to
/// an entry of the target child list advances the cursor to just past its
/// first occurrence at or after the cursor; siblings with no target entry are
/// skipped without moving it. Best effort by design — if no anchor is ever
/// found the block becomes the first child.
fn splice_child(
    new_parent: &mut Block,
    old_parent: &SourceNode,
    node: &SourceNode,
    usage_id: &UsageId,
    old_course_id: &str,
    mapper: &mut LocationMapper,
) -> MigrateResult<()> {
    let mut children = new_parent.children();
    if children.contains(usage_id) {
        // Already referenced: the parent's own projected child list carried
        // this block in (draft-only parent of a draft-only child).
        debug!("{} already a child of {}", usage_id, new_parent.locator);
        return Ok(());
    }

    let mut cursor = 0;
    for old_child in old_parent.children()? {
        if old_child.same_node(&node.address) {
            break;
        }
        let sibling = mapper.translate(old_course_id, &old_child, false, true)?;
        for idx in cursor..children.len() {
            if children[idx] == sibling.usage_id {
                cursor = idx + 1;
                break;
            }
        }
    }
    children.insert(cursor, usage_id.clone());
    new_parent.set_children(children);
    Ok(())
}
