use optilock_types::{Error, FieldHandle, Key, KeyPart};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashSet;

// ── Key construction ─────────────────────────────────────────────

#[test]
fn hash_key_with_string_value() {
    let key = Key::hash("author", "Ursula K. Le Guin").unwrap();
    assert_eq!(key.hash_part().name, "author");
    assert_eq!(key.hash_part().value, json!("Ursula K. Le Guin"));
    assert!(key.range_part().is_none());
}

#[test]
fn hash_key_with_number_value() {
    let key = Key::hash("date", 1_556_668_800_000u64).unwrap();
    assert_eq!(key.hash_part().value, json!(1_556_668_800_000u64));
}

#[test]
fn key_rejects_non_scalar_values() {
    let err = Key::hash("author", json!(["a"])).unwrap_err();
    assert!(matches!(err, Error::InvalidKeyValue { ref attribute } if attribute == "author"));
    assert!(Key::hash("author", json!(null)).is_err());
    assert!(Key::hash("author", json!(true)).is_err());
}

#[test]
fn range_key_is_validated() {
    let key = Key::hash("pk", "a").unwrap();
    assert!(key.clone().with_range("sk", json!({"x": 1})).is_err());
    let ranged = key.with_range("sk", 3).unwrap();
    assert_eq!(ranged.range_part().unwrap().name, "sk");
}

#[test]
fn key_part_new_accepts_scalars() {
    assert!(KeyPart::new("a", "s").is_ok());
    assert!(KeyPart::new("a", 1).is_ok());
}

// ── Conversions ──────────────────────────────────────────────────

#[test]
fn to_attributes_includes_both_parts() {
    let key = Key::hash("pk", "a").unwrap().with_range("sk", 2).unwrap();
    let attrs = key.to_attributes();
    assert_eq!(attrs.len(), 2);
    assert_eq!(attrs["pk"], json!("a"));
    assert_eq!(attrs["sk"], json!(2));
}

#[test]
fn storage_id_distinguishes_string_and_number() {
    let a = Key::hash("pk", "1").unwrap();
    let b = Key::hash("pk", 1).unwrap();
    assert_ne!(a.storage_id(), b.storage_id());
}

#[test]
fn storage_id_includes_range() {
    let a = Key::hash("pk", "x").unwrap().with_range("sk", 1).unwrap();
    let b = Key::hash("pk", "x").unwrap().with_range("sk", 2).unwrap();
    assert_ne!(a.storage_id(), b.storage_id());
}

#[test]
fn display_lists_key_parts() {
    let key = Key::hash("pk", "x").unwrap().with_range("sk", 1).unwrap();
    assert_eq!(key.to_string(), r#"pk="x",sk=1"#);
}

#[test]
fn key_serde_omits_missing_range() {
    let key = Key::hash("pk", "x").unwrap();
    let encoded = serde_json::to_value(&key).unwrap();
    assert!(encoded.get("range").is_none());
    let decoded: Key = serde_json::from_value(encoded).unwrap();
    assert_eq!(decoded, key);
}

// ── Field handles ────────────────────────────────────────────────

#[test]
fn field_handles_are_distinct() {
    let handles: HashSet<FieldHandle> = (0..64).map(|_| FieldHandle::new()).collect();
    assert_eq!(handles.len(), 64);
}

#[test]
fn field_handle_copy_is_equal() {
    let h = FieldHandle::new();
    let copy = h;
    assert_eq!(h, copy);
    assert_eq!(FieldHandle::from_uuid(h.as_uuid()), h);
}

#[test]
fn field_handle_display_prefix() {
    assert!(FieldHandle::new().to_string().starts_with("field:"));
}
