//! Structural diff between two untyped snapshots.

use super::ChangeRecord;
use crate::error::{ConfigError, Result};
use crate::formats::{Snapshot, kind_of};
use chrono::Utc;
use serde_json::Value;

/// Compare two decoded configurations and list the top-level fields that differ.
///
/// Both inputs must be mappings. Nested values are compared with deep
/// structural equality, so a change anywhere below a key is reported once
/// against that key.
///
/// # Errors
///
/// Returns [`ConfigError::TypeMismatch`] if either side is not a mapping.
pub fn diff(config_name: &str, old: &Value, new: &Value) -> Result<Vec<ChangeRecord>> {
    let old = as_mapping(config_name, "previous", old)?;
    let new = as_mapping(config_name, "current", new)?;
    Ok(diff_maps(config_name, old, new))
}

/// Compare two snapshots.
///
/// Removed and modified fields are emitted first, in key order of `old`,
/// followed by added fields in key order of `new`.
pub fn diff_maps(config_name: &str, old: &Snapshot, new: &Snapshot) -> Vec<ChangeRecord> {
    let mut changes = Vec::new();

    for (key, old_value) in old {
        match new.get(key) {
            Some(new_value) if new_value == old_value => {}
            Some(new_value) => changes.push(ChangeRecord::new(
                config_name,
                key,
                Some(old_value.clone()),
                Some(new_value.clone()),
                Utc::now(),
            )),
            None => changes.push(ChangeRecord::new(
                config_name,
                key,
                Some(old_value.clone()),
                None,
                Utc::now(),
            )),
        }
    }

    for (key, new_value) in new {
        if !old.contains_key(key) {
            changes.push(ChangeRecord::new(
                config_name,
                key,
                None,
                Some(new_value.clone()),
                Utc::now(),
            ));
        }
    }

    changes
}

fn as_mapping<'a>(config_name: &str, side: &str, value: &'a Value) -> Result<&'a Snapshot> {
    value.as_object().ok_or_else(|| {
        ConfigError::TypeMismatch(format!(
            "cannot diff '{}': {} value is {}, expected a mapping",
            config_name,
            side,
            kind_of(value)
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changes::ChangeKind;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_changed_and_added_fields() {
        let old = json!({"a": 1, "b": 2});
        let new = json!({"a": 1, "b": 3, "c": 4});

        let changes = diff("app", &old, &new).unwrap();
        assert_eq!(changes.len(), 2);

        assert_eq!(changes[0].field(), "b");
        assert_eq!(changes[0].kind(), ChangeKind::Modified);
        assert_eq!(changes[0].old_value(), Some(&json!(2)));
        assert_eq!(changes[0].new_value(), Some(&json!(3)));

        assert_eq!(changes[1].field(), "c");
        assert_eq!(changes[1].kind(), ChangeKind::Added);
        assert_eq!(changes[1].old_value(), None);
        assert_eq!(changes[1].new_value(), Some(&json!(4)));

        assert!(changes.iter().all(|c| c.config_name() == "app"));
    }

    #[test]
    fn test_removed_field() {
        let changes = diff("app", &json!({"x": "v"}), &json!({})).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field(), "x");
        assert_eq!(changes[0].kind(), ChangeKind::Removed);
        assert_eq!(changes[0].old_value(), Some(&json!("v")));
        assert_eq!(changes[0].new_value(), None);
    }

    #[test]
    fn test_nested_change_reported_on_top_level_key() {
        let old = json!({"server": {"port": 80, "tls": {"enabled": false}}, "name": "gw"});
        let new = json!({"server": {"port": 80, "tls": {"enabled": true}}, "name": "gw"});

        let changes = diff("app", &old, &new).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field(), "server");
    }

    #[test]
    fn test_sequence_order_matters() {
        let changes = diff("app", &json!({"hosts": ["a", "b"]}), &json!({"hosts": ["b", "a"]}))
            .unwrap();
        assert_eq!(changes.len(), 1);
    }

    #[test]
    fn test_removals_come_before_additions() {
        let changes = diff("app", &json!({"old": 1}), &json!({"new": 1})).unwrap();
        let kinds: Vec<_> = changes.iter().map(ChangeRecord::kind).collect();
        assert_eq!(kinds, vec![ChangeKind::Removed, ChangeKind::Added]);
    }

    #[test]
    fn test_non_mapping_input_is_type_mismatch() {
        let err = diff("app", &json!([1, 2]), &json!({})).unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch(msg) if msg.contains("previous")));

        let err = diff("app", &json!({}), &json!("text")).unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch(msg) if msg.contains("current")));
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[a-z]{0,8}".prop_map(Value::from),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::from),
                prop::collection::btree_map("[a-z]{1,4}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    fn arb_snapshot() -> impl Strategy<Value = Snapshot> {
        prop::collection::btree_map("[a-z]{1,6}", arb_value(), 0..8)
            .prop_map(|m| m.into_iter().collect())
    }

    proptest! {
        #[test]
        fn prop_identical_snapshots_produce_no_changes(snapshot in arb_snapshot()) {
            let copy = snapshot.clone();
            prop_assert!(diff_maps("app", &snapshot, &copy).is_empty());
        }

        #[test]
        fn prop_every_differing_key_is_reported_once(old in arb_snapshot(), new in arb_snapshot()) {
            let changes = diff_maps("app", &old, &new);
            let mut expected: Vec<&String> = old
                .iter()
                .filter(|(k, v)| new.get(*k) != Some(*v))
                .map(|(k, _)| k)
                .collect();
            expected.extend(new.keys().filter(|k| !old.contains_key(*k)));

            let reported: Vec<&str> = changes.iter().map(ChangeRecord::field).collect();
            prop_assert_eq!(reported, expected.iter().map(|k| k.as_str()).collect::<Vec<_>>());
        }
    }
}
