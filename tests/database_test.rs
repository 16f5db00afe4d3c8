use serde_json::{json, Value};
use synapsdb::core::config::{Config, SyncMode};
use synapsdb::core::database::Database;
use synapsdb::core::types::{DocId, INTERNAL_BITMAP_ID_MAX};
use synapsdb::index::index::CollectionKind;
use tempfile::tempdir;

fn tags(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

fn note(content: &str) -> Value {
    json!({ "type": "data/abstraction/note", "data": { "content": content } })
}

#[test]
fn test_note_lifecycle() {
    let db = Database::in_memory().unwrap();

    let stored = db
        .insert_document(note("hello"), &tags(&["work"]), &tags(&["urgent"]), &[])
        .unwrap();
    let id = stored.id.unwrap();
    assert!(id.value() > INTERNAL_BITMAP_ID_MAX);
    assert!(stored.checksum().is_some());
    assert!(stored.data.is_none());
    assert!(stored.index.is_none());

    let found = db.get_documents(&tags(&["work"]), &tags(&["urgent"]), &[], true).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, Some(id));
    assert!(found[0].data.is_none());

    assert!(db.get_documents(&tags(&["personal"]), &[], &[], false).unwrap().is_empty());

    assert!(db.delete_document(id).unwrap());
    assert!(db.get_documents(&tags(&["work"]), &[], &[], false).unwrap().is_empty());
}

#[test]
fn test_duplicate_insert_reuses_id() {
    let db = Database::in_memory().unwrap();

    let first = db.insert_document(note("same"), &tags(&["a"]), &[], &[]).unwrap();
    let second = db.insert_document(note("same"), &tags(&["b"]), &[], &[]).unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.created_timestamp, second.created_timestamp);
    assert!(second.modified_timestamp >= first.modified_timestamp);

    let stats = db.stats().unwrap();
    assert_eq!(stats.total_documents, 1);
    assert_eq!(stats.hash_index_entries, 1);

    // The second insert adds tags, it never removes the earlier ones
    assert_eq!(db.get_documents(&tags(&["a", "b"]), &[], &[], true).unwrap().len(), 1);
}

#[test]
fn test_full_documents_carry_payload() {
    let db = Database::in_memory().unwrap();
    let id = db.insert_document(note("payload"), &tags(&["work"]), &[], &[]).unwrap().id.unwrap();

    let full = db.get_document_by_id(id).unwrap().unwrap();
    assert_eq!(full.data, Some(json!({ "content": "payload" })));
    assert!(full.index.is_some());

    let listed = db.get_documents(&tags(&["work"]), &[], &[], false).unwrap();
    assert_eq!(listed[0].data, full.data);
    assert!(db.list_documents(&tags(&["work"]), &[], &[]).unwrap()[0].data.is_none());
}

#[test]
fn test_delete_removes_every_trace() {
    let db = Database::in_memory().unwrap();
    let doc = db
        .insert_document(note("gone"), &tags(&["work", "2024"]), &tags(&["urgent"]), &tags(&["inbox"]))
        .unwrap();
    let keep = db
        .insert_document(note("stays"), &tags(&["work"]), &tags(&["urgent"]), &[])
        .unwrap();
    let id = doc.id.unwrap();
    let checksum = doc.checksum().unwrap().to_string();

    db.delete_document(id).unwrap();

    assert!(db.get_document_by_id(id).unwrap().is_none());
    assert!(db.get_document_by_hash(&checksum).unwrap().is_none());
    for kind in CollectionKind::ALL {
        let collection = db.index().collection(kind);
        for key in collection.list_bitmaps().unwrap() {
            let bitmap = collection.get_bitmap(&key, false).unwrap().unwrap();
            assert!(!bitmap.contains(id.value()), "{} / {} still holds {}", kind.name(), key, id);
        }
    }

    let remaining = db.get_documents(&tags(&["work"]), &tags(&["urgent"]), &[], true).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, keep.id);

    assert!(db.delete_document(id).unwrap_err().is_not_found());
}

#[test]
fn test_batch_insert_keeps_valid_documents() {
    let db = Database::in_memory().unwrap();
    let invalid = json!({ "type": "data/abstraction/note" });

    let err = db
        .insert_document_array(vec![note("valid"), invalid], &tags(&["batch"]), &[], &[])
        .unwrap_err();

    assert_eq!(err.failures().len(), 1);
    assert_eq!(err.failures()[0].index, 1);
    assert!(err.failures()[0].error.is_validation());

    let stored = db.get_documents(&tags(&["batch"]), &[], &[], false).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].data, Some(json!({ "content": "valid" })));

    assert!(db.insert_document_array(Vec::new(), &[], &[], &[]).unwrap_err().is_validation());
}

#[test]
fn test_batch_delete_reports_unknown_ids() {
    let db = Database::in_memory().unwrap();
    let a = db.insert_document(note("a"), &[], &[], &[]).unwrap().id.unwrap();
    let b = db.insert_document(note("b"), &[], &[], &[]).unwrap().id.unwrap();

    let err = db.delete_document_array(&[a, DocId(9_999_999), b]).unwrap_err();
    assert_eq!(err.failures().len(), 1);
    assert_eq!(err.failures()[0].key.as_deref(), Some("9999999"));
    assert!(err.failures()[0].error.is_not_found());

    assert!(!db.has_document(a).unwrap());
    assert!(!db.has_document(b).unwrap());
}

#[test]
fn test_queries_combine_dimensions() {
    let db = Database::in_memory().unwrap();
    let a = db.insert_document(note("a"), &tags(&["work"]), &tags(&["urgent"]), &[]).unwrap().id;
    let b = db.insert_document(note("b"), &tags(&["work"]), &[], &tags(&["starred"])).unwrap().id;
    let c = db.insert_document(note("c"), &tags(&["home"]), &tags(&["urgent"]), &[]).unwrap().id;

    let ids = |docs: Vec<synapsdb::core::types::Document>| docs.into_iter().map(|d| d.id).collect::<Vec<_>>();

    assert_eq!(ids(db.get_documents(&tags(&["work"]), &[], &[], true).unwrap()), vec![a, b]);
    assert_eq!(ids(db.get_documents(&[], &tags(&["urgent"]), &[], true).unwrap()), vec![a, c]);
    assert_eq!(ids(db.get_documents(&tags(&["work"]), &[], &tags(&["starred"]), true).unwrap()), vec![b]);
    assert_eq!(ids(db.get_documents(&[], &[], &[], true).unwrap()), vec![a, b, c]);
    assert!(db.get_documents(&tags(&["work", "home"]), &[], &[], true).unwrap().is_empty());
}

#[test]
fn test_lookup_by_hash_and_arrays() {
    let db = Database::in_memory().unwrap();
    let a = db.insert_document(note("a"), &[], &[], &[]).unwrap();
    let b = db.insert_document(note("b"), &[], &[], &[]).unwrap();

    let by_hash = db.get_document_by_hash(a.checksum().unwrap()).unwrap().unwrap();
    assert_eq!(by_hash.id, a.id);
    assert!(db.get_document_by_hash("0000").unwrap().is_none());
    assert!(db.get_document_by_hash("").unwrap_err().is_validation());

    let hashes = vec![b.checksum().unwrap().to_string(), "missing".to_string()];
    let docs = db.get_documents_by_hash_array(&hashes, true).unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, b.id);

    let docs = db
        .get_documents_by_id_array(&[b.id.unwrap(), DocId(7_000_000), a.id.unwrap()], false)
        .unwrap();
    assert_eq!(docs.iter().map(|d| d.id).collect::<Vec<_>>(), vec![b.id, a.id]);
    assert!(db.get_documents_by_id_array(&[], false).unwrap_err().is_validation());
}

#[test]
fn test_schema_introspection() {
    let db = Database::in_memory().unwrap();
    let schemas = db.list_document_schemas();
    assert!(schemas.contains(&"data/abstraction/tab".to_string()));

    let info = db.get_document_schema("data/abstraction/file").unwrap();
    assert_eq!(info.index.primary_checksum_fields, vec!["meta.checksums.sha256".to_string()]);
    assert!(db.get_document_schema("data/abstraction/unknown").is_none());
}

#[test]
fn test_tabs_dedup_on_url() {
    let db = Database::in_memory().unwrap();
    let tab = |title: &str| {
        json!({
            "type": "data/abstraction/tab",
            "meta": { "browser": "firefox" },
            "data": { "url": "https://example.com", "title": title }
        })
    };

    let first = db.insert_document(tab("Old title"), &tags(&["browsing"]), &[], &[]).unwrap();
    let second = db.insert_document(tab("New title"), &tags(&["browsing"]), &[], &[]).unwrap();
    assert_eq!(first.id, second.id);

    let stored = db.get_document_by_id(first.id.unwrap()).unwrap().unwrap();
    assert_eq!(stored.data.unwrap()["title"], json!("New title"));
    assert_eq!(db.get_documents(&[], &tags(&["firefox"]), &[], true).unwrap().len(), 1);
}

#[test]
fn test_documents_survive_reopen() {
    let dir = tempdir().unwrap();
    let config = Config::with_storage_path(dir.path());

    let (id, checksum) = {
        let db = Database::open(config.clone()).unwrap();
        let doc = db.insert_document(note("durable"), &tags(&["work"]), &tags(&["urgent"]), &[]).unwrap();
        db.insert_document(note("second"), &[], &[], &[]).unwrap();
        let last = db.insert_document(note("last"), &[], &[], &[]).unwrap().id.unwrap();
        db.delete_document(last).unwrap();
        db.close().unwrap();
        (doc.id.unwrap(), doc.checksum().unwrap().to_string())
    };

    let db = Database::open(config).unwrap();
    assert_eq!(db.get_document_by_hash(&checksum).unwrap().unwrap().id, Some(id));

    let found = db.get_documents(&tags(&["work"]), &tags(&["urgent"]), &[], true).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, Some(id));

    // The counter survives, IDs of deleted documents are not handed out again
    let next = db.insert_document(note("after reopen"), &[], &[], &[]).unwrap().id.unwrap();
    assert_eq!(next.value(), id.value() + 3);
}

#[test]
fn test_storage_directory_is_locked() {
    let dir = tempdir().unwrap();
    let config = Config::with_storage_path(dir.path());

    let db = Database::open(config.clone()).unwrap();
    assert!(Database::open(config.clone()).is_err());
    db.close().unwrap();

    assert!(Database::open(config).is_ok());
}

#[test]
fn test_compaction_keeps_live_documents() {
    let dir = tempdir().unwrap();
    let config = Config::with_storage_path(dir.path());
    let db = Database::open(config).unwrap();

    let id = db.insert_document(note("v1"), &tags(&["work"]), &[], &[]).unwrap().id.unwrap();
    for i in 0..10 {
        let tmp = db.insert_document(note(&format!("tmp {}", i)), &tags(&["work"]), &[], &[]).unwrap();
        db.delete_document(tmp.id.unwrap()).unwrap();
    }

    db.compact().unwrap();
    let found = db.get_documents(&tags(&["work"]), &[], &[], false).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, Some(id));
}

#[test]
fn test_batch_update_keeps_valid_documents() {
    let db = Database::in_memory().unwrap();
    let existing = db.insert_document(note("kept"), &tags(&["old"]), &[], &[]).unwrap();

    let err = db
        .update_document_array(
            vec![note("kept"), json!({ "type": "data/abstraction/unknown", "data": {} })],
            &tags(&["new"]),
            &[],
            &[],
        )
        .unwrap_err();

    assert_eq!(err.failures().len(), 1);
    assert_eq!(err.failures()[0].index, 1);
    assert!(err.failures()[0].error.is_validation());

    let updated = db.get_documents(&tags(&["old", "new"]), &[], &[], true).unwrap();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].id, existing.id);
    assert_eq!(db.stats().unwrap().total_documents, 1);

    assert!(db.update_document_array(Vec::new(), &[], &[], &[]).unwrap_err().is_validation());
}

#[test]
fn test_batch_remove_detaches_known_documents() {
    let db = Database::in_memory().unwrap();
    let a = db.insert_document(note("a"), &tags(&["work"]), &[], &tags(&["starred"])).unwrap().id.unwrap();
    let b = db.insert_document(note("b"), &tags(&["work"]), &[], &[]).unwrap().id.unwrap();

    let err = db
        .remove_document_array(&[a, DocId(9_999_999), b], &tags(&["work"]), &[], &[])
        .unwrap_err();
    assert_eq!(err.failures().len(), 1);
    assert_eq!(err.failures()[0].index, 1);
    assert!(err.failures()[0].error.is_not_found());

    // Detached from "work" only, the records and other tags stay
    assert!(db.get_documents(&tags(&["work"]), &[], &[], true).unwrap().is_empty());
    assert!(db.has_document(a).unwrap());
    assert!(db.has_document(b).unwrap());
    assert_eq!(db.get_documents(&[], &[], &tags(&["starred"]), true).unwrap().len(), 1);

    let err = db.remove_document_array(&[a], &[], &[], &[]).unwrap_err();
    assert!(err.failures()[0].error.is_validation());
    assert!(db.remove_document_array(&[], &tags(&["work"]), &[], &[]).unwrap_err().is_validation());
}

#[test]
fn test_config_from_json_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("synapsdb.json");
    std::fs::write(
        &path,
        json!({
            "storage_path": dir.path().join("store"),
            "sync_mode": "Batch",
            "compression": false
        })
        .to_string(),
    )
    .unwrap();

    let config = Config::from_json_file(&path).unwrap();
    assert_eq!(config.sync_mode, SyncMode::Batch);
    assert!(!config.compression);
    assert_eq!(config.compression_threshold, Config::default().compression_threshold);

    let db = Database::open(config).unwrap();
    let id = db.insert_document(note("batched"), &tags(&["work"]), &[], &[]).unwrap().id.unwrap();
    db.close().unwrap();

    let db = Database::open(Config::from_json_file(&path).unwrap()).unwrap();
    assert!(db.has_document(id).unwrap());

    std::fs::write(&path, "{ not json").unwrap();
    assert!(Config::from_json_file(&path).is_err());
}

#[test]
fn test_oversized_document_is_rejected() {
    let dir = tempdir().unwrap();
    let config = Config {
        compression: false,
        max_value_size: 4096,
        ..Config::with_storage_path(dir.path())
    };

    {
        let db = Database::open(config.clone()).unwrap();
        let big = "x".repeat(16 * 1024);
        let err = db.insert_document(note(&big), &tags(&["work"]), &[], &[]).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(db.stats().unwrap().hash_index_entries, 0);

        db.insert_document(note("small"), &tags(&["work"]), &[], &[]).unwrap();
        db.close().unwrap();
    }

    let db = Database::open(config).unwrap();
    let found = db.get_documents(&tags(&["work"]), &[], &[], false).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].data, Some(json!({ "content": "small" })));
}
