use optilock::{ConditionBuilder, LockError, NAME_PLACEHOLDER, VALUE_PLACEHOLDER, VersionStore};
use optilock_model::Entity;
use optilock_store::{Condition, ConditionError};
use optilock_types::{Attributes, FieldHandle, Version};
use pretty_assertions::assert_eq;
use serde_json::json;

fn attrs(value: serde_json::Value) -> Attributes {
    value.as_object().cloned().unwrap()
}

// ── VersionStore ─────────────────────────────────────────────────

#[test]
fn unset_version_reads_as_zero() {
    let versions = VersionStore::new(FieldHandle::new());
    let entity = Entity::default();
    assert_eq!(versions.get(&entity), None);
    assert_eq!(versions.current(&entity), Version::ZERO);
}

#[test]
fn stamp_bumps_and_returns_next() {
    let versions = VersionStore::new(FieldHandle::new());
    let mut entity = Entity::default();
    assert_eq!(versions.stamp(&mut entity).unwrap(), Version::new(1));
    assert_eq!(versions.stamp(&mut entity).unwrap(), Version::new(2));
    assert_eq!(versions.get(&entity), Some(Version::new(2)));
}

#[test]
fn set_overrides_without_validation() {
    let versions = VersionStore::new(FieldHandle::new());
    let mut entity = Entity::default();
    versions.set(&mut entity, Version::new(10));
    versions.set(&mut entity, Version::new(3));
    assert_eq!(versions.stamp(&mut entity).unwrap(), Version::new(4));
}

#[test]
fn stamp_at_max_leaves_entity_unchanged() {
    let versions = VersionStore::new(FieldHandle::new());
    let mut entity = Entity::default();
    versions.set(&mut entity, Version::new(u64::MAX));
    let err = versions.stamp(&mut entity).unwrap_err();
    assert!(matches!(err, LockError::VersionOverflow(v) if v == Version::new(u64::MAX)));
    assert_eq!(versions.get(&entity), Some(Version::new(u64::MAX)));
}

#[test]
fn stores_with_different_fields_do_not_share() {
    let a = VersionStore::new(FieldHandle::new());
    let b = VersionStore::new(FieldHandle::new());
    let mut entity = Entity::default();
    a.set(&mut entity, Version::new(5));
    assert_eq!(b.get(&entity), None);
    assert!(entity.attributes().is_empty());
}

// ── ConditionBuilder ─────────────────────────────────────────────

#[test]
fn version_condition_renders() {
    let builder = ConditionBuilder::new("__version");
    let condition = builder.version_condition(Version::new(3), None);
    assert_eq!(
        condition.to_string(),
        "attribute_not_exists(#optimisticlockingversion) OR #optimisticlockingversion < :optimisticlockingversion"
    );
    assert_eq!(condition.names()[NAME_PLACEHOLDER], "__version");
    assert_eq!(condition.values()[VALUE_PLACEHOLDER], json!(3));
}

#[test]
fn merge_ands_caller_condition_first() {
    let builder = ConditionBuilder::new("__version");
    let merged = builder
        .merge(Some(Condition::equals("author", "x")), Version::new(1))
        .unwrap();
    assert_eq!(
        merged.to_string(),
        "(#author = :author) AND (attribute_not_exists(#optimisticlockingversion) OR #optimisticlockingversion < :optimisticlockingversion)"
    );
    assert_eq!(merged.names().len(), 2);
    assert_eq!(merged.values().len(), 2);
}

#[test]
fn merge_without_caller_is_version_condition() {
    let builder = ConditionBuilder::new("__version");
    let merged = builder.merge(None, Version::new(1)).unwrap();
    assert_eq!(merged, builder.version_condition(Version::new(1), None));
}

#[test]
fn placeholders_skip_names_taken_by_caller() {
    let builder = ConditionBuilder::new("__version");
    let caller = Condition::attribute_exists("title")
        .with_name(NAME_PLACEHOLDER, "title")
        .with_name(format!("{NAME_PLACEHOLDER}1"), "title");
    let (name, value) = builder.placeholders(Some(&caller));
    assert_eq!(name, "#optimisticlockingversion2");
    assert_eq!(value, ":optimisticlockingversion2");

    let merged = builder.merge(Some(caller), Version::new(1)).unwrap();
    assert_eq!(merged.names()["#optimisticlockingversion2"], "__version");
    assert_eq!(merged.names()[NAME_PLACEHOLDER], "title");
}

#[test]
fn placeholders_skip_values_taken_by_caller() {
    let builder = ConditionBuilder::new("__version");
    let caller = Condition::attribute_exists("title").with_value(VALUE_PLACEHOLDER, 1);
    let (name, value) = builder.placeholders(Some(&caller));
    assert_eq!(name, "#optimisticlockingversion1");
    assert_eq!(value, ":optimisticlockingversion1");
}

#[test]
fn merged_condition_admits_only_older_versions() {
    let builder = ConditionBuilder::new("__version");
    let condition = builder.version_condition(Version::new(3), None);

    assert!(condition.evaluate(None).unwrap());
    assert!(condition.evaluate(Some(&attrs(json!({"author": "a"})))).unwrap());
    assert!(condition.evaluate(Some(&attrs(json!({"__version": 2})))).unwrap());
    assert!(!condition.evaluate(Some(&attrs(json!({"__version": 3})))).unwrap());
    assert!(!condition.evaluate(Some(&attrs(json!({"__version": 4})))).unwrap());
}

#[test]
fn stamp_item_writes_attribute() {
    let builder = ConditionBuilder::new("rev");
    let mut item = attrs(json!({"author": "a"}));
    builder.stamp_item(&mut item, Version::new(9));
    assert_eq!(item, attrs(json!({"author": "a", "rev": 9})));
}

#[test]
fn caller_collision_with_plain_condition_is_reported() {
    let left = Condition::equals("author", "x");
    let right = Condition::equals("author", "y");
    assert_eq!(
        left.and(right).unwrap_err(),
        ConditionError::PlaceholderCollision(":author".to_string())
    );
}
