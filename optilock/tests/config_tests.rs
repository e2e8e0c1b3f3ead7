mod common;

use optilock::{
    DEFAULT_ATTRIBUTE_NAME, LockError, OptimisticLocking, OptimisticLockingConfig,
};
use optilock_model::Schema;
use optilock_store::{MemoryBackend, Model, Operation, Stage};
use optilock_types::Version;
use pretty_assertions::assert_eq;
use std::io::Write;
use std::sync::Arc;

// ── Defaults and builders ────────────────────────────────────────

#[test]
fn defaults() {
    let config = OptimisticLockingConfig::default();
    assert_eq!(config.attribute_name, DEFAULT_ATTRIBUTE_NAME);
    assert_eq!(config.attribute_name, "__version");
    assert!(!config.fetch_on_conflict);
    assert!(!config.allow_unsupported_batch);
}

#[test]
fn builders_set_fields() {
    let config = OptimisticLockingConfig::new()
        .with_attribute_name("rev")
        .with_fetch_on_conflict(true)
        .with_allow_unsupported_batch(true);
    assert_eq!(config.attribute_name, "rev");
    assert!(config.fetch_on_conflict);
    assert!(config.allow_unsupported_batch);
}

#[test]
fn each_config_gets_its_own_version_field() {
    let a = OptimisticLockingConfig::default();
    let b = OptimisticLockingConfig::default();
    assert_ne!(a.version_field, b.version_field);
    assert_eq!(a.clone().version_field, a.version_field);
}

// ── TOML ─────────────────────────────────────────────────────────

#[test]
fn parses_full_toml() {
    let config = OptimisticLockingConfig::from_toml_str(
        r#"
            attribute_name = "version"
            fetch_on_conflict = true
            allow_unsupported_batch = true
        "#,
    )
    .unwrap();
    assert_eq!(config.attribute_name, "version");
    assert!(config.fetch_on_conflict);
    assert!(config.allow_unsupported_batch);
}

#[test]
fn missing_keys_take_defaults() {
    let config = OptimisticLockingConfig::from_toml_str("").unwrap();
    assert_eq!(config.attribute_name, DEFAULT_ATTRIBUTE_NAME);
    assert!(!config.fetch_on_conflict);
}

#[test]
fn accepts_alternate_key_names() {
    let config = OptimisticLockingConfig::from_toml_str(
        r#"
            fetch_item_on_write_error = true
            allow_unsupported = true
        "#,
    )
    .unwrap();
    assert!(config.fetch_on_conflict);
    assert!(config.allow_unsupported_batch);
}

#[test]
fn malformed_toml_is_parse_error() {
    let err = OptimisticLockingConfig::from_toml_str("fetch_on_conflict = \"yes\"").unwrap_err();
    assert!(matches!(err, LockError::ConfigParse(_)));
}

#[test]
fn invalid_attribute_names_are_rejected() {
    for name in ["", "#version", ":version"] {
        let toml = format!("attribute_name = {name:?}");
        let err = OptimisticLockingConfig::from_toml_str(&toml).unwrap_err();
        assert!(matches!(err, LockError::InvalidConfig(_)), "{name:?}: {err}");
    }
}

#[test]
fn load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "attribute_name = \"rev\"").unwrap();
    writeln!(file, "fetch_on_conflict = true").unwrap();

    let config = OptimisticLockingConfig::load_from(file.path()).unwrap();
    assert_eq!(config.attribute_name, "rev");
    assert!(config.fetch_on_conflict);
}

#[test]
fn load_from_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = OptimisticLockingConfig::load_from(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, LockError::Io(_)));
}

// ── Installation ─────────────────────────────────────────────────

#[test]
fn new_validates_config() {
    let err = OptimisticLocking::new(OptimisticLockingConfig::default().with_attribute_name(""))
        .unwrap_err();
    assert!(matches!(err, LockError::InvalidConfig(_)));
}

#[test]
fn install_rejects_key_attribute_as_version() {
    let schema = Schema::new("BookCollection", "author");
    let backend = Arc::new(MemoryBackend::new().with_table(&schema));
    let locking =
        OptimisticLocking::new(OptimisticLockingConfig::default().with_attribute_name("author"))
            .unwrap();

    let err = locking.install(Model::new(schema, backend)).err().unwrap();
    assert!(matches!(err, LockError::InvalidConfig(_)));
}

#[test]
fn install_declares_hidden_attribute_and_plugin() {
    let schema = Schema::new("BookCollection", "author");
    let backend = Arc::new(MemoryBackend::new().with_table(&schema));
    let locking = OptimisticLocking::new(OptimisticLockingConfig::default()).unwrap();

    let books = locking.install(Model::new(schema, backend)).unwrap();
    let hidden = books.model().schema().hidden_attributes();
    assert_eq!(hidden.len(), 1);
    assert_eq!(hidden[0].attribute_name, "__version");
    assert_eq!(hidden[0].field, books.config().version_field);
    assert_eq!(books.model().plugins().len(), 1);
    assert_eq!(books.model().plugins()[0].name(), OptimisticLocking::NAME);
}

#[test]
fn registered_slots_follow_config() {
    let plain = OptimisticLocking::new(OptimisticLockingConfig::default()).unwrap();
    let hooks = plain.hooks();
    assert!(hooks.contains(Operation::Put, Stage::Called));
    assert!(hooks.contains(Operation::Put, Stage::RequestPre));
    assert!(!hooks.contains(Operation::Put, Stage::RequestPost));
    assert!(hooks.contains(Operation::BatchPut, Stage::Called));
    assert!(!hooks.contains(Operation::BatchPut, Stage::RequestPre));
    assert!(hooks.contains(Operation::Update, Stage::Called));

    let full = OptimisticLocking::new(
        OptimisticLockingConfig::default()
            .with_fetch_on_conflict(true)
            .with_allow_unsupported_batch(true),
    )
    .unwrap();
    let hooks = full.hooks();
    assert!(hooks.contains(Operation::Put, Stage::RequestPost));
    assert!(hooks.contains(Operation::BatchPut, Stage::RequestPre));
}

#[test]
fn two_instances_keep_separate_versions() {
    let (_backend, first) = common::make_books(OptimisticLockingConfig::default());
    let (_backend, second) = common::make_books(OptimisticLockingConfig::default());
    let mut entity = common::book("a");

    first.set_version(&mut entity, Version::new(7));
    assert_eq!(first.get_version(&entity), Some(Version::new(7)));
    assert_eq!(second.get_version(&entity), None);
}
