/// Complete SynapsDB API Demo
///
/// Demonstrates the major database operations:
/// - Insert with contexts, features and filters
/// - Dedup by checksum
/// - Tag queries (AND across dimensions)
/// - Detach, delete and batch errors
/// - Statistics
///
/// Run with `RUST_LOG=debug` to see the index at work.

use synapsdb::core::config::Config;
use synapsdb::core::database::Database;
use serde_json::json;
use tracing_subscriber::{fmt, EnvFilter};

fn tags(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();

    println!("\n╔═══════════════════════════════════════════════╗");
    println!("║    SynapsDB Document Index - API Demo         ║");
    println!("╚═══════════════════════════════════════════════╝\n");

    // Step 1: Create database
    let temp_dir = tempfile::tempdir()?;
    let db = Database::open(Config::with_storage_path(temp_dir.path()))?;
    println!("Database opened at {}\n", temp_dir.path().display());

    // Step 2: INSERT
    println!("Step 2: INSERT - Adding documents...");
    let note = db.insert_document(
        json!({ "type": "data/abstraction/note", "data": { "content": "Ship the index rewrite" } }),
        &tags(&["work", "projects"]),
        &tags(&["urgent"]),
        &[],
    )?;
    println!("  note  -> id {} checksum {}", note.id.map_or(0, |id| id.value()), note.checksum().unwrap_or("-"));

    let tab = db.insert_document(
        json!({
            "type": "data/abstraction/tab",
            "meta": { "browser": "firefox" },
            "data": { "url": "https://docs.rs/roaring", "title": "roaring - Rust" }
        }),
        &tags(&["work", "reading"]),
        &[],
        &tags(&["starred"]),
    )?;
    println!("  tab   -> id {}", tab.id.map_or(0, |id| id.value()));

    // Step 3: DEDUP
    println!("\nStep 3: DEDUP - Same URL, new title...");
    let again = db.insert_document(
        json!({
            "type": "data/abstraction/tab",
            "data": { "url": "https://docs.rs/roaring", "title": "roaring (updated)" }
        }),
        &tags(&["reading"]),
        &[],
        &[],
    )?;
    println!("  tab   -> id {} (same document: {})", again.id.map_or(0, |id| id.value()), again.id == tab.id);

    // Step 4: QUERY
    println!("\nStep 4: QUERY");
    for (contexts, features) in [
        (tags(&["work"]), Vec::new()),
        (tags(&["work"]), tags(&["urgent"])),
        (Vec::new(), tags(&["data/abstraction/tab"])),
        (tags(&["personal"]), Vec::new()),
    ] {
        let docs = db.list_documents(&contexts, &features, &[])?;
        let ids: Vec<String> = docs.iter().filter_map(|d| d.id).map(|id| id.to_string()).collect();
        println!("  contexts {:?} features {:?} -> [{}]", contexts, features, ids.join(", "));
    }

    // Step 5: DETACH + DELETE
    println!("\nStep 5: DETACH + DELETE");
    if let Some(id) = tab.id {
        db.remove_document(id, &tags(&["work"]), &[], &[])?;
        println!("  tab detached from \"work\": {} left in work", db.list_documents(&tags(&["work"]), &[], &[])?.len());
    }
    if let (Some(id), Some(checksum)) = (note.id, note.checksum()) {
        db.delete_document(id)?;
        println!("  note deleted, lookup by hash: {:?}", db.get_document_by_hash(checksum)?);
    }

    // Step 6: BATCH ERRORS
    println!("\nStep 6: BATCH - One valid, one invalid...");
    let batch = vec![
        json!({ "type": "data/abstraction/note", "data": { "content": "valid" } }),
        json!({ "type": "data/abstraction/unknown", "data": {} }),
    ];
    if let Err(e) = db.insert_document_array(batch, &tags(&["batch"]), &[], &[]) {
        println!("  {}", e);
    }

    // Step 7: STATS
    println!("\nStep 7: STATS");
    let stats = db.stats()?;
    println!("  documents: {}", stats.total_documents);
    println!("  hash entries: {}", stats.hash_index_entries);
    println!("  next id: {}", stats.next_document_id);
    for collection in &stats.collections {
        println!("  bitmaps/{:<9} {} bitmap(s)", collection.name, collection.bitmap_count);
    }
    println!("  schemas: {:?}", db.list_document_schemas());

    db.close()?;
    println!("\nDone!");
    Ok(())
}
