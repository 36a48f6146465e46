//! End-to-end migration scenarios driving the public API.

use serde_json::json;

use splitmigrate::{
    Branch, FieldMap, LegacyAddress, LegacyStore, LocationMapper, MigrateError,
    MigrationDriver, MigrationReport, SourceNode, SplitStore, TargetStore, UsageId,
};

// ==================== Fixture helpers ====================

fn course() -> LegacyAddress {
    LegacyAddress::new("edX", "CS101", "course", "2013")
}

fn addr(category: &str, name: &str) -> LegacyAddress {
    LegacyAddress::new("edX", "CS101", category, name)
}

fn node(address: LegacyAddress, extra: &[(&str, serde_json::Value)], children: &[&LegacyAddress]) -> SourceNode {
    let mut fields = FieldMap::new();
    fields.insert("display_name".into(), json!(address.name.clone()));
    for (k, v) in extra {
        fields.insert(k.to_string(), v.clone());
    }
    if !children.is_empty() {
        fields.insert(
            "children".into(),
            json!(children.iter().map(|c| c.to_string()).collect::<Vec<_>>()),
        );
    }
    SourceNode::new(address, fields)
}

fn migrate(store: &LegacyStore) -> (SplitStore, LocationMapper, MigrationReport) {
    let mut target = SplitStore::new();
    let mut mapper = LocationMapper::new();
    let published = store.published_view();
    let drafts = store.draft_view();
    let report = MigrationDriver::new(&published, &drafts, &mut target, &mut mapper)
        .migrate_course(&course(), "migrator", None)
        .expect("migration succeeds");
    (target, mapper, report)
}

fn children_of(target: &SplitStore, course_id: &str, branch: Branch, usage: &str) -> Vec<UsageId> {
    let locator = splitmigrate::BlockLocator::new(course_id, branch, UsageId::new(usage));
    target.get_item(&locator).expect("block exists").children()
}

// ==================== Whole-course scenario ====================

/// The canonical scenario: published root -> chapter1, plus a draft-only
/// chapter2 attached under the root. The legacy root's child list already
/// names chapter2 (parents pointed at draft-only children even in the
/// published tree).
fn scenario_store() -> LegacyStore {
    let chapter1 = addr("chapter", "chapter1");
    let chapter2 = addr("chapter", "chapter2");

    let mut store = LegacyStore::new();
    store.add_node(node(course(), &[], &[&chapter1, &chapter2]));
    store.add_node(node(chapter1, &[], &[]));
    store.add_node(node(chapter2.as_draft(), &[], &[]));
    store
}

#[test]
fn test_scenario_branches_diverge() {
    let (target, _, report) = migrate(&scenario_store());
    assert_eq!(report.new_course_id, "edX.CS101.2013");
    assert_eq!(report.nodes_copied, 1);
    assert_eq!(report.orphans_pruned, 1);
    assert_eq!(report.drafts_created, 1);
    assert_eq!(report.parents_spliced, 1);

    let index = target.get_course_index("edX.CS101.2013").unwrap();
    let published = index.branches[&Branch::Published];
    let draft = index.branches[&Branch::Draft];
    assert_ne!(published, draft, "draft merge must cut its own versions");
    assert!(target.structure(&published).is_some());
    assert!(target.structure(&draft).is_some());
}

#[test]
fn test_scenario_published_root_has_only_chapter1() {
    let (target, _, report) = migrate(&scenario_store());
    let children = children_of(&target, &report.new_course_id, Branch::Published, "course.2013");
    assert_eq!(children, vec![UsageId::new("chapter.chapter1")]);
}

#[test]
fn test_scenario_draft_root_has_both_chapters_in_order() {
    let (target, _, report) = migrate(&scenario_store());
    let children = children_of(&target, &report.new_course_id, Branch::Draft, "course.2013");
    assert_eq!(
        children,
        vec![UsageId::new("chapter.chapter1"), UsageId::new("chapter.chapter2")]
    );
}

#[test]
fn test_scenario_chapter2_only_on_draft_branch() {
    let (target, _, report) = migrate(&scenario_store());
    let draft_loc = splitmigrate::BlockLocator::new(
        report.new_course_id.clone(),
        Branch::Draft,
        UsageId::new("chapter.chapter2"),
    );
    assert!(target.has_item(&draft_loc));
    assert!(!target.has_item(&draft_loc.on_branch(Branch::Published)));
}

// ==================== Draft aliasing ====================

#[test]
fn test_draft_aliases_published_when_no_drafts_exist() {
    let chapter1 = addr("chapter", "chapter1");
    let mut store = LegacyStore::new();
    store.add_node(node(course(), &[], &[&chapter1]));
    store.add_node(node(chapter1, &[], &[]));

    let (target, _, report) = migrate(&store);
    let index = target.get_course_index(&report.new_course_id).unwrap();
    assert_eq!(
        index.branches[&Branch::Published],
        index.branches[&Branch::Draft],
        "with no draft nodes the alias from the publish phase survives"
    );
}

// ==================== Case A field diffs ====================

#[test]
fn test_draft_update_drops_unset_fields_and_applies_set_ones() {
    let chapter1 = addr("chapter", "chapter1");
    let mut store = LegacyStore::new();
    store.add_node(node(course(), &[], &[&chapter1]));
    store.add_node(node(
        chapter1.clone(),
        &[("x", json!(1)), ("y", json!(2))],
        &[],
    ));
    // Draft variant: y is no longer set, z is new. display_name also gone.
    let mut draft_fields = FieldMap::new();
    draft_fields.insert("x".into(), json!(1));
    draft_fields.insert("z".into(), json!(3));
    store.add_node(SourceNode::new(chapter1.as_draft(), draft_fields));

    let (target, _, report) = migrate(&store);
    assert_eq!(report.drafts_updated, 1);

    let draft_loc = splitmigrate::BlockLocator::new(
        report.new_course_id.clone(),
        Branch::Draft,
        UsageId::new("chapter.chapter1"),
    );
    let block = target.get_item(&draft_loc).unwrap();
    assert_eq!(block.fields.get("x"), Some(&json!(1)));
    assert_eq!(block.fields.get("z"), Some(&json!(3)));
    assert!(block.fields.get("y").is_none(), "y reverted to default");

    // The published side keeps its original fields.
    let published = target.get_item(&draft_loc.on_branch(Branch::Published)).unwrap();
    assert_eq!(published.fields.get("y"), Some(&json!(2)));
    assert!(published.fields.get("z").is_none());
}

// ==================== Sibling-order preservation ====================

#[test]
fn test_draft_only_sibling_spliced_between_published_ones() {
    // Legacy parent children [a, b, c]; b exists only as a draft.
    let a = addr("vertical", "a");
    let b = addr("vertical", "b");
    let c = addr("vertical", "c");
    let parent = addr("sequential", "lesson");

    let mut store = LegacyStore::new();
    store.add_node(node(course(), &[], &[&parent]));
    store.add_node(node(parent.clone(), &[], &[&a, &b, &c]));
    store.add_node(node(a, &[], &[]));
    store.add_node(node(b.as_draft(), &[], &[]));
    store.add_node(node(c, &[], &[]));

    let (target, _, report) = migrate(&store);
    let children = children_of(
        &target,
        &report.new_course_id,
        Branch::Draft,
        "sequential.lesson",
    );
    assert_eq!(
        children,
        vec![
            UsageId::new("vertical.a"),
            UsageId::new("vertical.b"),
            UsageId::new("vertical.c")
        ],
        "b must land immediately after a and before c"
    );

    // The published parent never sees b.
    let published = children_of(
        &target,
        &report.new_course_id,
        Branch::Published,
        "sequential.lesson",
    );
    assert_eq!(
        published,
        vec![UsageId::new("vertical.a"), UsageId::new("vertical.c")]
    );
}

#[test]
fn test_draft_only_chain_parent_and_child() {
    // A draft-only parent whose only child is also draft-only: the parent's
    // projected child list already names the child, so the splice must not
    // duplicate it.
    let vertical = addr("vertical", "scratch");
    let video = addr("video", "clip");
    let chapter = addr("chapter", "chapter1");

    let mut store = LegacyStore::new();
    store.add_node(node(course(), &[], &[&chapter]));
    store.add_node(node(chapter.clone(), &[], &[&vertical]));
    store.add_node(node(vertical.as_draft(), &[], &[&video]));
    store.add_node(node(video.as_draft(), &[], &[]));

    let (target, _, report) = migrate(&store);
    assert_eq!(report.drafts_created, 2);

    let vertical_children = children_of(
        &target,
        &report.new_course_id,
        Branch::Draft,
        "vertical.scratch",
    );
    assert_eq!(vertical_children, vec![UsageId::new("video.clip")]);

    let chapter_children = children_of(
        &target,
        &report.new_course_id,
        Branch::Draft,
        "chapter.chapter1",
    );
    assert_eq!(chapter_children, vec![UsageId::new("vertical.scratch")]);
}

// ==================== Projection exactness ====================

#[test]
fn test_no_field_leakage_into_copied_blocks() {
    let chapter1 = addr("chapter", "chapter1");
    let mut store = LegacyStore::new();
    store.add_node(node(course(), &[], &[&chapter1]));
    store.add_node(node(chapter1, &[("graded", json!(true))], &[]));

    let (target, _, report) = migrate(&store);
    let locator = splitmigrate::BlockLocator::new(
        report.new_course_id,
        Branch::Published,
        UsageId::new("chapter.chapter1"),
    );
    let block = target.get_item(&locator).unwrap();
    let keys: Vec<&str> = block.fields.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["display_name", "graded"]);
}

// ==================== Orphaned islands ====================

#[test]
fn test_orphaned_pages_are_copied() {
    let about = addr("about", "overview");
    let mut store = LegacyStore::new();
    store.add_node(node(course(), &[], &[]));
    store.add_node(node(about, &[], &[]));

    let (target, _, report) = migrate(&store);
    let locator = splitmigrate::BlockLocator::new(
        report.new_course_id,
        Branch::Published,
        UsageId::new("about.overview"),
    );
    assert!(target.has_item(&locator));
}

// ==================== Re-run rejection ====================

#[test]
fn test_second_migration_of_same_course_rejected() {
    let store = scenario_store();
    let mut target = SplitStore::new();
    let mut mapper = LocationMapper::new();
    let published = store.published_view();
    let drafts = store.draft_view();

    MigrationDriver::new(&published, &drafts, &mut target, &mut mapper)
        .migrate_course(&course(), "migrator", None)
        .unwrap();
    let err = MigrationDriver::new(&published, &drafts, &mut target, &mut mapper)
        .migrate_course(&course(), "migrator", None)
        .unwrap_err();
    assert!(matches!(err, MigrateError::DuplicateCourse(_, _)));
}

#[test]
fn test_explicit_course_id_is_used() {
    let store = scenario_store();
    let mut target = SplitStore::new();
    let mut mapper = LocationMapper::new();
    let published = store.published_view();
    let drafts = store.draft_view();

    let report = MigrationDriver::new(&published, &drafts, &mut target, &mut mapper)
        .migrate_course(&course(), "migrator", Some("cs101.fall"))
        .unwrap();
    assert_eq!(report.new_course_id, "cs101.fall");
    assert!(target.get_course_index("cs101.fall").is_ok());
}

// ==================== Missing source course ====================

#[test]
fn test_missing_course_root_fails_cleanly() {
    let store = LegacyStore::new();
    let mut target = SplitStore::new();
    let mut mapper = LocationMapper::new();
    let published = store.published_view();
    let drafts = store.draft_view();

    let err = MigrationDriver::new(&published, &drafts, &mut target, &mut mapper)
        .migrate_course(&course(), "migrator", None)
        .unwrap_err();
    assert!(matches!(err, MigrateError::SourceCourseNotFound(_)));
}
