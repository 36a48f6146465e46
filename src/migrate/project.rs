//! Field projection from a legacy node into target-store form.

use crate::mapper::LocationMapper;
use crate::store::SourceNode;
use crate::types::fields::set_string_list;
use crate::types::{FieldMap, MigrateResult, CHILDREN_FIELD};

/// Project a legacy node's fields for the target store.
///
/// The result holds exactly the node's explicitly-set fields; inherited and
/// default values are never copied because the target store's inheritance
/// model recomputes them. Address-valued entries in the `children` field are
/// rewritten through the mapper (creating entries as needed).
///
/// Legacy parents may list draft-only children even in their published child
/// list. Those references are translated and kept as-is here; the publish
/// phase prunes whatever never materializes.
pub fn project_fields(
    node: &SourceNode,
    old_course_id: &str,
    published: bool,
    mapper: &mut LocationMapper,
) -> MigrateResult<FieldMap> {
    let mut fields = node.explicit_fields().clone();
    if fields.contains_key(CHILDREN_FIELD) {
        let children = node.children()?;
        let mut translated = Vec::with_capacity(children.len());
        for child in &children {
            let locator = mapper.translate(old_course_id, child, published, true)?;
            translated.push(locator.usage_id.as_str().to_string());
        }
        set_string_list(&mut fields, CHILDREN_FIELD, translated);
    }
    Ok(fields)
}
