use locker_crypto::{
    derive_key, CryptoError, DerivedKey, KdfParams, Salt, KEY_SIZE,
    SALT_SIZE,
};

fn test_params() -> KdfParams {
    KdfParams {
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
    }
}

// ── derive_key ───────────────────────────────────────────────────

#[test]
fn derive_key_produces_consistent_results() {
    let salt = Salt::from_bytes([1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16]);
    let params = test_params();
    let key1 = derive_key("Secret123!", &salt, &params).unwrap();
    let key2 = derive_key("Secret123!", &salt, &params).unwrap();
    assert_eq!(key1.as_bytes(), key2.as_bytes());
}

#[test]
fn different_passwords_produce_different_keys() {
    let salt = Salt::from_bytes([1; SALT_SIZE]);
    let params = test_params();
    let key1 = derive_key("password1", &salt, &params).unwrap();
    let key2 = derive_key("password2", &salt, &params).unwrap();
    assert_ne!(key1.as_bytes(), key2.as_bytes());
}

#[test]
fn different_salts_produce_different_keys() {
    let params = test_params();
    let salt1 = Salt::from_bytes([1; SALT_SIZE]);
    let salt2 = Salt::from_bytes([2; SALT_SIZE]);
    let key1 = derive_key("same_password", &salt1, &params).unwrap();
    let key2 = derive_key("same_password", &salt2, &params).unwrap();
    assert_ne!(key1.as_bytes(), key2.as_bytes());
}

#[test]
fn different_params_produce_different_keys() {
    let salt = Salt::from_bytes([3; SALT_SIZE]);
    let slower = KdfParams {
        time_cost: 2,
        ..test_params()
    };
    let key1 = derive_key("pw", &salt, &test_params()).unwrap();
    let key2 = derive_key("pw", &salt, &slower).unwrap();
    assert_ne!(key1.as_bytes(), key2.as_bytes());
}

#[test]
fn derive_key_produces_cipher_sized_key() {
    let salt = Salt::from_bytes([1; SALT_SIZE]);
    let key = derive_key("pw", &salt, &test_params()).unwrap();
    assert_eq!(key.as_bytes().len(), KEY_SIZE);
}

#[test]
fn empty_password_is_rejected() {
    let salt = Salt::random();
    let err = derive_key("", &salt, &test_params()).unwrap_err();
    assert!(matches!(err, CryptoError::KeyDerivation(_)));
}

#[test]
fn invalid_params_are_rejected() {
    let params = KdfParams {
        memory_cost: 1024,
        time_cost: 0,
        parallelism: 1,
    };
    let err = derive_key("pw", &Salt::random(), &params).unwrap_err();
    assert!(matches!(err, CryptoError::KeyDerivation(_)));
}

// ── DerivedKey ───────────────────────────────────────────────────

#[test]
fn key_debug_does_not_leak_bytes() {
    let key = DerivedKey::from_bytes([42u8; KEY_SIZE]);
    let debug = format!("{:?}", key);
    assert!(debug.contains("REDACTED"));
    assert!(!debug.contains("42"));
}

// ── Salt ─────────────────────────────────────────────────────────

#[test]
fn random_salts_differ() {
    assert_ne!(Salt::random().as_bytes(), Salt::random().as_bytes());
}

#[test]
fn salt_base64_roundtrip() {
    let salt = Salt::random();
    let decoded = Salt::from_base64(&salt.to_base64()).unwrap();
    assert_eq!(salt, decoded);
}

#[test]
fn salt_from_base64_rejects_wrong_length() {
    assert!(Salt::from_base64("AAAA").is_err());
    assert!(Salt::from_base64("not base64!").is_err());
}

#[test]
fn salt_serializes_as_string() {
    let salt = Salt::from_bytes([0; SALT_SIZE]);
    let json = serde_json::to_string(&salt).unwrap();
    assert_eq!(json, "\"AAAAAAAAAAAAAAAAAAAAAA==\"");
    let back: Salt = serde_json::from_str(&json).unwrap();
    assert_eq!(back, salt);
}

// ── KdfParams ────────────────────────────────────────────────────

#[test]
fn default_params_are_owasp_argon2id() {
    let params = KdfParams::default();
    assert_eq!(params.memory_cost, 19 * 1024);
    assert_eq!(params.time_cost, 2);
    assert_eq!(params.parallelism, 1);
}

#[test]
fn params_serde_roundtrip() {
    let params = test_params();
    let json = serde_json::to_string(&params).unwrap();
    let back: KdfParams = serde_json::from_str(&json).unwrap();
    assert_eq!(back, params);
}
