//! Dump-file round trip: serialize a legacy tree, load it, migrate it.

use std::io::Write;

use serde_json::json;
use tempfile::NamedTempFile;

use splitmigrate::cli::commands;
use splitmigrate::{LegacyAddress, LegacyDump, LegacyStore, SourceNode, SourceStore};

fn scenario_dump() -> LegacyDump {
    let course = LegacyAddress::new("edX", "CS101", "course", "2013");
    let chapter1 = LegacyAddress::new("edX", "CS101", "chapter", "chapter1");
    let chapter2 = LegacyAddress::new("edX", "CS101", "chapter", "chapter2");

    let mut root_fields = splitmigrate::FieldMap::new();
    root_fields.insert("display_name".into(), json!("Intro CS"));
    root_fields.insert(
        "children".into(),
        json!([chapter1.to_string(), chapter2.to_string()]),
    );

    LegacyDump {
        nodes: vec![
            SourceNode::new(course, root_fields),
            SourceNode::new(chapter1, splitmigrate::FieldMap::new()),
            SourceNode::new(chapter2.as_draft(), splitmigrate::FieldMap::new()),
        ],
    }
}

fn write_dump(dump: &LegacyDump) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    let payload = serde_json::to_vec_pretty(dump).expect("serializable dump");
    file.write_all(&payload).expect("dump written");
    file
}

#[test]
fn test_dump_roundtrips_through_serde() {
    let file = write_dump(&scenario_dump());
    let raw = std::fs::read(file.path()).unwrap();
    let reloaded: LegacyDump = serde_json::from_slice(&raw).unwrap();
    assert_eq!(reloaded.nodes.len(), 3);

    let store = LegacyStore::from_dump(reloaded);
    assert_eq!(store.node_count(), 3);
    assert_eq!(store.course_roots().len(), 1);

    // Draft view sees the draft chapter; published view does not.
    let course = LegacyAddress::new("edX", "CS101", "course", "2013");
    assert_eq!(store.published_view().get_items(&course).len(), 2);
    assert_eq!(store.draft_view().get_items(&course).len(), 3);
}

#[test]
fn test_cmd_info_reads_a_dump() {
    let file = write_dump(&scenario_dump());
    commands::cmd_info(file.path(), true).expect("info succeeds");
}

#[test]
fn test_cmd_migrate_runs_the_full_pipeline() {
    let file = write_dump(&scenario_dump());
    commands::cmd_migrate(file.path(), "migrator", Some("cs101.test"), true, true)
        .expect("migration succeeds");
}

#[test]
fn test_cmd_migrate_rejects_courseless_dump() {
    let file = write_dump(&LegacyDump { nodes: vec![] });
    let err = commands::cmd_migrate(file.path(), "migrator", None, false, false).unwrap_err();
    assert!(matches!(err, splitmigrate::MigrateError::DumpMissingCourse));
}

#[test]
fn test_cmd_migrate_rejects_garbage() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"not json").unwrap();
    assert!(commands::cmd_migrate(file.path(), "migrator", None, false, false).is_err());
}
