use serdict_core::core_api::CoreErrorCode;
use serdict_core::hasher::{Key, KeyKind};
use serdict_core::primitive::PrimitiveValue;
use serdict_core::record::Record;
use serdict_core::table::{Entry, NO_ENTRY, Table, bucket_index};

fn rec(a: i32) -> Record {
    Record::new([("a".to_string(), PrimitiveValue::Int32(a))])
}

fn int_pairs(keys: &[i32]) -> Vec<(Key, Record)> {
    keys.iter()
        .enumerate()
        .map(|(i, &k)| (Key::Int(k), rec(i as i32 + 1)))
        .collect()
}

#[test]
fn colliding_keys_chain_newest_first() {
    // Three entries fit the minimum bucket count of 3; 8 collides with 5.
    let table = Table::build(int_pairs(&[5, 12, 8]), KeyKind::Int32).expect("build");
    assert_eq!(table.capacity(), 3);

    let bucket = bucket_index(Key::Int(5).hash_code(), table.capacity());
    assert_eq!(bucket, 2);
    assert_eq!(table.buckets()[bucket], 2);
    assert_eq!(table.entries()[2].key, Key::Int(8));
    assert_eq!(table.entries()[2].next, 0);
    assert_eq!(table.entries()[0].next, NO_ENTRY);

    assert_eq!(table.buckets(), &[1, NO_ENTRY, 2]);
    assert_eq!(table.count(), 3);
    assert_eq!(table.free_count(), 0);
    assert_eq!(table.free_list(), NO_ENTRY);
    table.validate().expect("valid table");
}

#[test]
fn entries_keep_input_order_and_values() {
    let table = Table::build(int_pairs(&[10, 20, 30, 40]), KeyKind::Int32).expect("build");
    assert_eq!(table.capacity(), 7);

    let keys: Vec<&Key> = table.entries().iter().map(|e| &e.key).collect();
    assert_eq!(
        keys,
        vec![&Key::Int(10), &Key::Int(20), &Key::Int(30), &Key::Int(40)]
    );
    assert_eq!(table.entries()[3].value, rec(4));
    assert_eq!(table.entries()[1].hash_code, 20);
}

#[test]
fn duplicate_keys_are_rejected() {
    let pairs = vec![(Key::Int(1), rec(1)), (Key::Int(1), rec(2))];
    let err = Table::build(pairs, KeyKind::Int32).expect_err("duplicate");
    assert_eq!(err.code, CoreErrorCode::DuplicateKey);
    assert!(err.message.contains("duplicate key 1"), "{}", err.message);
}

#[test]
fn duplicate_string_keys_are_rejected() {
    let pairs = vec![
        (Key::Str("potion".to_string()), rec(1)),
        (Key::Str("sword".to_string()), rec(2)),
        (Key::Str("potion".to_string()), rec(3)),
    ];
    let err = Table::build(pairs, KeyKind::String).expect_err("duplicate");
    assert_eq!(err.code, CoreErrorCode::DuplicateKey);
    assert!(err.message.contains("potion"));
}

#[test]
fn empty_input_is_rejected() {
    let err = Table::<Record>::build(Vec::new(), KeyKind::Int32).expect_err("empty");
    assert_eq!(err.code, CoreErrorCode::EmptyDictionary);
}

#[test]
fn sentinel_keys_never_become_entries() {
    let pairs = vec![
        (Key::Int(0), rec(0)),
        (Key::Int(9), rec(9)),
        (Key::Int(0), rec(0)),
    ];
    let table = Table::build(pairs, KeyKind::Int32).expect("build");
    assert_eq!(table.entries().len(), 1);
    assert_eq!(table.entries()[0].key, Key::Int(9));
    assert!(table.lookup(&Key::Int(0)).is_none());
}

#[test]
fn only_sentinels_is_empty() {
    let pairs = vec![(Key::Str(String::new()), rec(1))];
    let err = Table::build(pairs, KeyKind::String).expect_err("only sentinels");
    assert_eq!(err.code, CoreErrorCode::EmptyDictionary);
}

#[test]
fn key_of_wrong_kind_is_rejected() {
    let pairs = vec![(Key::Str("5".to_string()), rec(1))];
    let err = Table::build(pairs, KeyKind::Int32).expect_err("wrong kind");
    assert_eq!(err.code, CoreErrorCode::TypeMismatch);
}

#[test]
fn every_key_is_found_through_its_bucket() {
    let keys: Vec<i32> = (1..=40).map(|k| k * 17).collect();
    let table = Table::build(int_pairs(&keys), KeyKind::Int32).expect("build");
    assert_eq!(table.capacity(), 47);

    for (i, &k) in keys.iter().enumerate() {
        let entry = table.lookup(&Key::Int(k)).expect("key present");
        assert_eq!(entry.value, rec(i as i32 + 1));
    }
    assert!(table.lookup(&Key::Int(18)).is_none());
}

#[test]
fn live_entries_skip_free_list_and_sentinel_slots() {
    let entries = vec![
        Entry {
            hash_code: 4,
            next: NO_ENTRY,
            key: Key::Int(4),
            value: 'a',
        },
        Entry {
            hash_code: -1,
            next: NO_ENTRY,
            key: Key::Int(0),
            value: '\0',
        },
        Entry {
            hash_code: 2,
            next: NO_ENTRY,
            key: Key::Int(2),
            value: 'b',
        },
        Entry {
            hash_code: 0,
            next: 0,
            key: Key::Int(0),
            value: '\0',
        },
    ];
    let table = Table::from_parts(vec![NO_ENTRY, 0, 2], entries, 3, 1, 1);
    let live: Vec<char> = table.live_entries().map(|e| e.value).collect();
    assert_eq!(live, vec!['a', 'b']);
}

#[test]
fn validate_detects_cycles_and_orphans() {
    let looped = Table::from_parts(
        vec![0, NO_ENTRY, NO_ENTRY],
        vec![
            Entry {
                hash_code: 3,
                next: 1,
                key: Key::Int(3),
                value: (),
            },
            Entry {
                hash_code: 6,
                next: 0,
                key: Key::Int(6),
                value: (),
            },
        ],
        2,
        0,
        NO_ENTRY,
    );
    let err = looped.validate().expect_err("cycle");
    assert_eq!(err.code, CoreErrorCode::ShapeMismatch);
    assert_eq!(looped.chain(0).count(), 2);

    let orphan = Table::from_parts(
        vec![NO_ENTRY, NO_ENTRY, NO_ENTRY],
        vec![Entry {
            hash_code: 1,
            next: NO_ENTRY,
            key: Key::Int(1),
            value: (),
        }],
        1,
        0,
        NO_ENTRY,
    );
    let err = orphan.validate().expect_err("orphan");
    assert!(err.message.contains("not reachable"), "{}", err.message);
}
