//! Tests for hosts below the modern capability level.

use prefsafe_lib::keystore::KeyEntry;
use prefsafe_lib::payload;
use prefsafe_lib::prelude::*;
use prefsafe_lib::test_utils::{legacy_test_host, sample_set, test_config};

#[test]
fn test_legacy_round_trip() {
    let host = legacy_test_host();
    let store = open_with_config(&host, test_config()).unwrap();
    assert_eq!(store.backend_kind(), Some(BackendKind::HybridRsaAes));

    let mut editor = store.edit();
    editor.put_string("name", Some("legacy")).unwrap();
    editor.put_long("n", -7).unwrap();
    editor.put_string_set("tags", Some(sample_set(&["a", "b"]))).unwrap();
    assert!(editor.commit());

    assert_eq!(store.get_string("name", None).as_deref(), Some("legacy"));
    assert_eq!(store.get_long("n", 0), -7);
    assert_eq!(store.get_string_set("tags", None), Some(sample_set(&["a", "b"])));
}

#[test]
fn test_side_store_holds_wrapped_master_key() {
    let host = legacy_test_host();
    let config = test_config();
    let _store = open_with_config(&host, config.clone()).unwrap();

    let side_store = host.preferences(&config.side_store_name).unwrap();
    let wrapped = side_store.get_string(&config.master_key_entry, None).unwrap();
    assert_eq!(payload::from_text(&wrapped).unwrap().len(), config.rsa_key_size / 8);

    match host.key_store().entry(&config.key_alias).unwrap().as_deref() {
        Some(KeyEntry::PrivateKey(pair)) => {
            let cert = pair.certificate();
            assert_eq!(cert.subject, format!("CN={}", config.key_alias));
            assert_eq!(cert.serial_number, 1);
            assert_eq!(
                Some(cert.not_after),
                prefsafe_lib::clock::add_years(cert.not_before, 40)
            );
        }
        other => panic!("expected key pair, found {:?}", other),
    }
}

#[test]
fn test_reopen_reuses_master_key() {
    let host = legacy_test_host();
    let store = open_with_config(&host, test_config()).unwrap();
    let mut editor = store.edit();
    editor.put_int("n", 11).unwrap();
    editor.apply();
    drop(editor);
    drop(store);

    let reopened = open_with_config(&host, test_config()).unwrap();
    assert_eq!(reopened.get_int("n", 0), 11);
}

#[test]
fn test_lost_master_key_degrades_reads_and_fails_writes() {
    let host = legacy_test_host();
    let config = test_config();
    let store = open_with_config(&host, config.clone()).unwrap();

    let mut editor = store.edit();
    editor.put_int("n", 1).unwrap();
    editor.apply();
    drop(editor);

    let side_store = host.preferences(&config.side_store_name).unwrap();
    let mut side_editor = side_store.edit();
    side_editor.remove(&config.master_key_entry).unwrap();
    assert!(side_editor.commit());

    assert_eq!(store.get_int("n", -1), -1);
    let mut editor = store.edit();
    let err = editor.put_int("m", 2).unwrap_err();
    assert_eq!(err.code(), PrefsafeErrorCode::InvalidKey);
}
