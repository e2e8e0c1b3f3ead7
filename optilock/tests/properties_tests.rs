//! Property-based tests for version stamping and conditions.

mod common;

use common::{book, fetching, make_books, stored_version};
use optilock::{ConditionBuilder, NAME_PLACEHOLDER, OptimisticLockingConfig, VALUE_PLACEHOLDER};
use optilock_store::Condition;
use optilock_types::{Attributes, Version};
use proptest::prelude::*;
use serde_json::json;

// ===================================================================
// Stamping
// ===================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn sequential_writes_are_dense(writes in 1u64..20) {
        let (backend, books) = make_books(OptimisticLockingConfig::default());
        let mut entity = book("a");
        tokio_test::block_on(async {
            for _ in 0..writes {
                books.put(&mut entity).await.unwrap();
            }
        });
        prop_assert_eq!(books.get_version(&entity), Some(Version::new(writes)));
        let stored = tokio_test::block_on(stored_version(&backend, "a"));
        prop_assert_eq!(stored, Some(Version::new(writes)));
    }

    #[test]
    fn any_stale_copy_conflicts(writes in 2u64..12, behind in 1u64..12) {
        let behind = behind.min(writes);
        let (backend, books) = make_books(fetching());
        let mut entity = book("a");
        let mut stale = None;
        let err = tokio_test::block_on(async {
            for i in 0..writes {
                if i == writes - behind {
                    stale = Some(entity.clone());
                }
                books.put(&mut entity).await.unwrap();
            }
            let mut stale = stale.take().unwrap();
            books.put(&mut stale).await.unwrap_err()
        });
        prop_assert!(err.is_conflict());
        prop_assert_eq!(
            books.get_version(err.stored_entity().unwrap()),
            Some(Version::new(writes))
        );
        let stored = tokio_test::block_on(stored_version(&backend, "a"));
        prop_assert_eq!(stored, Some(Version::new(writes)));
    }
}

// ===================================================================
// Conditions
// ===================================================================

proptest! {
    #[test]
    fn version_condition_admits_only_older(stored in proptest::option::of(0u64..1000), next in 1u64..1000) {
        let condition = ConditionBuilder::new("__version").version_condition(Version::new(next), None);
        let item: Attributes = match stored {
            Some(v) => json!({"author": "a", "__version": v}),
            None => json!({"author": "a"}),
        }
        .as_object()
        .cloned()
        .unwrap();
        let expected = stored.is_none_or(|v| v < next);
        prop_assert_eq!(condition.evaluate(Some(&item)).unwrap(), expected);
    }

    #[test]
    fn placeholders_never_collide(taken in proptest::collection::btree_set(0u32..6, 0..6)) {
        let mut caller = Condition::attribute_exists("title");
        for suffix in &taken {
            let suffix = if *suffix == 0 { String::new() } else { suffix.to_string() };
            caller = caller
                .with_name(format!("{NAME_PLACEHOLDER}{suffix}"), "title")
                .with_value(format!("{VALUE_PLACEHOLDER}{suffix}"), "x");
        }
        let builder = ConditionBuilder::new("__version");
        let (name, value) = builder.placeholders(Some(&caller));
        prop_assert!(!caller.uses_name(&name));
        prop_assert!(!caller.uses_value(&value));

        let merged = builder.merge(Some(caller), Version::new(1)).unwrap();
        prop_assert_eq!(merged.names()[&name].as_str(), "__version");
    }
}
