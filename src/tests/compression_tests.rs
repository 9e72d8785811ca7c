//! End-to-end compression scenario: a database written compressed round
//! trips through partial and full reads, and flipping `use_compression` on
//! an existing database migrates its on-disk form on the next write rather
//! than leaving both a `.json` and a `.ddb` file behind.

use crate::config::Config;
use crate::Engine;
use serde_json::json;

fn nested_document() -> serde_json::Value {
    json!({
        "users": {
            "alice": {"age": 30, "tags": ["admin", "eu"]},
            "bob": {"age": 24, "tags": []},
        },
        "count": 2,
    })
}

#[test]
fn compressed_database_round_trips_full_and_partial_reads() {
    super::init_test_tracing();
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::new(Config::new(dir.path()).with_compression(true));

    let doc = nested_document();
    engine.create("db", &doc, false).unwrap();

    assert!(dir.path().join("db.ddb").is_file());
    assert!(!dir.path().join("db.json").exists());

    assert_eq!(engine.read("db").unwrap(), doc);
    assert_eq!(
        engine.partial_read("db", "users").unwrap(),
        Some(doc["users"].clone())
    );

    engine
        .partial_write("db", "count", &json!(3))
        .unwrap();
    assert_eq!(engine.partial_read("db", "count").unwrap(), Some(json!(3)));
}

#[test]
fn switching_compression_mode_replaces_the_old_file_form() {
    super::init_test_tracing();
    let dir = tempfile::tempdir().unwrap();
    let plain_config = Config::new(dir.path()).with_compression(false);
    let engine = Engine::new(plain_config.clone());
    engine.create("db", &nested_document(), false).unwrap();
    assert!(dir.path().join("db.json").is_file());

    let compressed_engine = Engine::new(plain_config.with_compression(true));
    compressed_engine.write("db", &nested_document()).unwrap();

    assert!(dir.path().join("db.ddb").is_file());
    assert!(!dir.path().join("db.json").exists());
    assert_eq!(compressed_engine.read("db").unwrap(), nested_document());
}
