use serdict_core::core_api::CoreErrorCode;
use serdict_core::hasher::{Key, KeyKind, legacy_string_hash};
use serdict_core::primitive::{PrimitiveKind, PrimitiveValue};

// Values produced by the runtime's pre-randomization string hash.
const GOLDEN: [(&str, i32); 10] = [
    ("", 757_602_046),
    ("a", -842_352_707),
    ("abc", -320_589_142),
    ("hello", 60_422_186),
    ("Hello World", -983_357_510),
    ("sword", 1_458_767_453),
    ("é", -842_352_827),
    ("😀", 970_947_761),
    ("a\0b", -842_352_707),
    ("sword\0shield", 1_458_767_453),
];

#[test]
fn legacy_string_hash_matches_golden_vectors() {
    for (input, expected) in GOLDEN {
        assert_eq!(legacy_string_hash(input), expected, "hash of {input:?}");
    }
}

#[test]
fn string_hash_is_stable_across_calls() {
    let first = Key::Str("abc".to_string()).hash_code();
    let second = Key::Str(String::from("abc")).hash_code();
    assert_eq!(first, second);
    assert_eq!(first, 1_826_894_506);
}

#[test]
fn stored_hash_code_is_non_negative() {
    for (input, _) in GOLDEN {
        assert!(Key::Str(input.to_string()).hash_code() >= 0);
    }
    assert!(Key::Int(-5).hash_code() >= 0);
    assert_eq!(Key::Int(-5).hash_code(), 2_147_483_643);
}

#[test]
fn sentinel_keys_are_zero_and_empty() {
    assert!(Key::Int(0).is_sentinel());
    assert!(Key::Str(String::new()).is_sentinel());
    assert!(!Key::Int(-1).is_sentinel());
    assert!(!Key::Str(" ".to_string()).is_sentinel());
}

#[test]
fn integer_keys_parse_only_in_canonical_form() {
    assert_eq!(Key::parse(KeyKind::Int32, "42").expect("42"), Key::Int(42));
    assert_eq!(Key::parse(KeyKind::Int32, "-7").expect("-7"), Key::Int(-7));

    for bad in ["007", "+7", " 7", "7.0", "abc", "2147483648", ""] {
        let err = Key::parse(KeyKind::Int32, bad).expect_err(bad);
        assert_eq!(err.code, CoreErrorCode::InvalidKey, "{bad:?}");
        assert!(err.message.contains(bad), "{}", err.message);
    }
}

#[test]
fn string_keys_parse_verbatim() {
    assert_eq!(
        Key::parse(KeyKind::String, " 007 ").expect("string key"),
        Key::Str(" 007 ".to_string())
    );
}

#[test]
fn unsupported_key_kinds_are_rejected() {
    for kind in [PrimitiveKind::Bool, PrimitiveKind::Float, PrimitiveKind::Double] {
        let err = KeyKind::from_primitive(kind).expect_err("unsupported kind");
        assert_eq!(err.code, CoreErrorCode::UnsupportedKeyKind);
    }
    let err = Key::from_primitive(&PrimitiveValue::Double(1.0)).expect_err("double key");
    assert_eq!(err.code, CoreErrorCode::UnsupportedKeyKind);
}
