//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::{Map, Number, Value};

use ledgervault_core::{Address, Key};
use ledgervault_perms::Permissions;

/// Generate a valid key. Scalars outside the curve order are skipped.
pub fn key() -> impl Strategy<Value = Key> {
    any::<[u8; 32]>().prop_filter_map("scalar out of range", |bytes| Key::from_bytes(&bytes).ok())
}

/// Generate a random address.
pub fn address() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>().prop_map(Address::from_bytes)
}

/// Generate an address spelled with random letter case.
pub fn address_text() -> impl Strategy<Value = String> {
    (address(), any::<u64>()).prop_map(|(address, mask)| {
        let hex = address.to_hex();
        hex.chars()
            .enumerate()
            .map(|(i, c)| if i >= 2 && (mask >> (i % 64)) & 1 == 1 { c.to_ascii_uppercase() } else { c })
            .collect()
    })
}

/// Generate any permissions byte.
pub fn permissions() -> impl Strategy<Value = Permissions> {
    any::<u8>().prop_map(Permissions::from_bits)
}

/// Generate a POSIX file component other than `.` and `..`.
pub fn file_component() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_][A-Za-z0-9_.-]{0,40}".prop_filter("special component", |s| s != "." && s != "..")
}

/// Generate a vault object name: a bare address or `directory/file`.
pub fn vault_filename() -> impl Strategy<Value = String> {
    prop_oneof![
        address().prop_map(|a| a.to_hex()),
        (address(), file_component()).prop_map(|(dir, file)| format!("{}/{}", dir, file)),
    ]
}

/// Generate an arbitrary JSON value of bounded depth.
///
/// Numbers are integers so that a value survives a text round trip unchanged.
pub fn json_payload() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(Number::from(n))),
        ".{0,24}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-zA-Z_]{1,8}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<String, Value>>())),
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgervault_core::{canonical_json, decode, encode_value, hash, recover, VaultRequest};
    use ledgervault_perms::VaultFilename;

    proptest! {
        #[test]
        fn test_address_is_deterministic(seed in any::<[u8; 32]>()) {
            if let (Ok(k1), Ok(k2)) = (Key::from_bytes(&seed), Key::from_bytes(&seed)) {
                prop_assert_eq!(k1.address(), k2.address());
            }
        }

        #[test]
        fn test_envelope_round_trip(key in key(), payload in json_payload()) {
            prop_assume!(!payload.is_null());
            let envelope = encode_value(&payload, &key).unwrap();
            let decoded = decode(&envelope).unwrap();
            prop_assert_eq!(&decoded.payload, &payload);
            prop_assert_eq!(decoded.signatory, key.address());
        }

        #[test]
        fn test_decode_is_pure(key in key(), payload in json_payload()) {
            prop_assume!(!payload.is_null());
            let envelope = encode_value(&payload, &key).unwrap();
            prop_assert_eq!(decode(&envelope).unwrap(), decode(&envelope).unwrap());
        }

        #[test]
        fn test_canonical_json_ignores_key_order(payload in json_payload()) {
            let reparsed: Value = serde_json::from_str(&canonical_json(&payload)).unwrap();
            prop_assert_eq!(canonical_json(&reparsed), canonical_json(&payload));
        }

        #[test]
        fn test_sign_recover(key in key(), text in ".{0,64}") {
            let digest = hash(&text);
            let signature = key.sign(&digest).unwrap();
            prop_assert_eq!(recover(&digest, &signature).unwrap(), key.address());
        }

        #[test]
        fn test_permission_bits(bits in any::<u8>()) {
            let p = Permissions::from_bits(bits);
            prop_assert_eq!(p.can_read(), bits & 0x04 != 0);
            prop_assert_eq!(p.can_write(), bits & 0x02 != 0);
            prop_assert_eq!(p.can_append(), bits & 0x01 != 0);
            prop_assert_eq!(p.is_directory(), bits & 0x80 != 0);
        }

        #[test]
        fn test_generated_filenames_are_valid(name in vault_filename()) {
            let file = VaultFilename::parse(&name);
            prop_assert!(file.is_valid());
            prop_assert_eq!(file.has_directory(), name.len() > 42);
        }

        #[test]
        fn test_case_does_not_change_storage_key(text in address_text(), file in file_component()) {
            let lower = format!("{}/{}", text.to_lowercase(), file);
            let mixed = format!("{}/{}", text, file);
            prop_assert_eq!(
                VaultFilename::parse(&mixed).canonical_name(),
                VaultFilename::parse(&lower).canonical_name()
            );
        }

        #[test]
        fn test_filename_parse_never_panics(name in ".{0,100}") {
            let file = VaultFilename::parse(&name);
            if !file.is_valid() {
                prop_assert!(file.canonical_name().is_none());
            }
        }

        #[test]
        fn test_request_survives_envelope(key in key(), contract in address(), name in vault_filename(), data in json_payload()) {
            let request = VaultRequest::new(ledgervault_core::RequestType::Write, contract)
                .with_file(name)
                .with_data(data);
            let envelope = ledgervault_core::encode(&request, &key).unwrap();
            let decoded = decode(&envelope).unwrap();
            prop_assert_eq!(VaultRequest::from_payload(&decoded.payload), request);
        }
    }
}
