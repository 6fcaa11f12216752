//! Shared proptest generators for resolver domain values.

use proptest::prelude::*;
use serde_json::{Map, Value};

/// Credential types with a dedicated field table.
pub const KNOWN_CREDENTIAL_TYPES: &[&str] = &[
    "windows",
    "basic",
    "ssh_password",
    "vmware",
    "jdbc",
    "jms",
    "ssh_private_key",
    "snmpv3",
];

/// Supported access type tags.
pub const SUPPORTED_ACCESS_TYPES: &[&str] = &["access_key", "aws_iam", "azure_ad", "gcp"];

/// Generate secret names in the gateway's path style.
pub fn secret_name_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-zA-Z0-9_-]{1,12}", 1..4)
        .prop_map(|segments| format!("/{}", segments.join("/")))
}

/// Generate credential type tags: known types in random case plus custom ones.
pub fn credential_type_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (prop::sample::select(KNOWN_CREDENTIAL_TYPES), any::<bool>()).prop_map(|(t, upper)| {
            if upper {
                t.to_uppercase()
            } else {
                t.to_string()
            }
        }),
        "[a-z][a-z0-9_]{2,15}",
    ]
}

/// Generate access type tags that are not supported.
pub fn unsupported_access_type_strategy() -> impl Strategy<Value = String> {
    "[a-z_]{1,16}".prop_filter("must not be a supported tag", |t| {
        !SUPPORTED_ACCESS_TYPES.contains(&t.as_str())
    })
}

/// Generate non-empty secret strings that do not parse as a JSON object.
pub fn scalar_secret_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z0-9!@#$%^&*]{1,64}",
        any::<i64>().prop_map(|n| n.to_string()),
        "[a-z]{1,8}".prop_map(|s| format!("[\"{s}\"]")),
    ]
    .prop_filter("must not be a JSON object", |s| {
        !matches!(serde_json::from_str::<Value>(s), Ok(Value::Object(_)))
    })
}

/// Generate JSON leaf values.
pub fn json_leaf_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[A-Za-z0-9 ._-]{0,24}".prop_map(Value::String),
        any::<i32>().prop_map(Value::from),
        any::<bool>().prop_map(Value::Bool),
    ]
}

/// Generate JSON values nested up to two levels deep.
pub fn json_value_strategy() -> impl Strategy<Value = Value> {
    json_leaf_strategy().prop_recursive(2, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z_]{1,8}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Generate structured secret records.
pub fn structured_secret_strategy() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("[a-z_]{1,12}", json_value_strategy(), 0..8)
        .prop_map(|m| m.into_iter().collect())
}

/// Generate secret values of the kind a credential might carry.
pub fn secret_value_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9!@#$%^&*]{8,64}"
}
