use locker_auth::{
    validate_username, AuthError, CredentialBackend, CredentialStore, JsonFileBackend,
    MemoryBackend,
};
use locker_crypto::KdfParams;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn test_params() -> KdfParams {
    KdfParams {
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
    }
}

fn store() -> CredentialStore {
    CredentialStore::open_in_memory(test_params())
}

/// A file-backed store plus a handle on its JSON file for inspection.
fn file_store() -> (TempDir, JsonFileBackend, CredentialStore) {
    let temp = TempDir::new().unwrap();
    let backend = JsonFileBackend::new(temp.path().join("users.json"));
    let store = CredentialStore::new(Box::new(backend.clone()), test_params());
    (temp, backend, store)
}

// ── register ─────────────────────────────────────────────────────

#[test]
fn register_then_verify() {
    let store = store();
    store.register("alice", "Secret123!").unwrap();
    assert!(store.verify("alice", "Secret123!"));
    assert!(!store.verify("alice", "WrongPass"));
}

#[test]
fn register_trims_username() {
    let store = store();
    store.register("  alice ", "Secret123!").unwrap();
    assert_eq!(store.usernames().unwrap(), vec!["alice"]);
    assert!(store.verify("alice", "Secret123!"));
    assert!(store.verify(" alice", "Secret123!"));
}

#[test]
fn password_is_not_trimmed() {
    let store = store();
    store.register("alice", " padded ").unwrap();
    assert!(store.verify("alice", " padded "));
    assert!(!store.verify("alice", "padded"));
}

#[test]
fn duplicate_username_rejected() {
    let store = store();
    store.register("alice", "Secret123!").unwrap();
    let err = store.register("alice", "Other456!").unwrap_err();
    assert!(matches!(err, AuthError::UsernameTaken(ref u) if u == "alice"));
    // Original password still works.
    assert!(store.verify("alice", "Secret123!"));
}

#[test]
fn username_differing_only_in_case_is_taken() {
    let store = store();
    store.register("alice", "Secret123!").unwrap();

    for name in ["Alice", "ALICE", " aLiCe "] {
        assert!(
            matches!(store.register(name, "Other456!"), Err(AuthError::UsernameTaken(_))),
            "{name:?} accepted"
        );
    }
    assert_eq!(store.usernames().unwrap(), vec!["alice"]);
    assert!(!store.verify("Alice", "Other456!"));
}

#[test]
fn empty_fields_rejected() {
    let store = store();
    assert!(matches!(
        store.register("", "pw").unwrap_err(),
        AuthError::InvalidUsername(_)
    ));
    assert!(matches!(
        store.register("   ", "pw").unwrap_err(),
        AuthError::InvalidUsername(_)
    ));
    assert!(matches!(
        store.register("bob", "").unwrap_err(),
        AuthError::EmptyPassword
    ));
    assert!(store.usernames().unwrap().is_empty());
}

#[test]
fn unsafe_usernames_rejected() {
    for name in ["../etc", "a/b", "a\\b", ".hidden", "nul\0byte", "spaced name"] {
        assert!(
            matches!(validate_username(name), Err(AuthError::InvalidUsername(_))),
            "{name:?} accepted"
        );
    }
    assert!(validate_username(&"x".repeat(65)).is_err());
    assert!(validate_username(&"x".repeat(64)).is_ok());
    assert!(validate_username("alice_01.b-c").is_ok());
}

#[test]
fn records_get_distinct_salts() {
    let (_temp, backend, store) = file_store();
    store.register("alice", "same-password").unwrap();
    store.register("bob", "same-password").unwrap();

    let records = backend.load().unwrap();
    let alice = &records["alice"];
    let bob = &records["bob"];

    assert_ne!(alice.key_salt, bob.key_salt);
    assert_ne!(alice.hash_salt, bob.hash_salt);
    assert_ne!(alice.hash_salt, alice.key_salt);
    assert!(!alice.password_hash.matches(&bob.password_hash));
    assert_eq!(alice.kdf, test_params());
}

// ── verify / authenticate ────────────────────────────────────────

#[test]
fn verify_fails_closed_on_unknown_user_and_empty_password() {
    let store = store();
    store.register("alice", "Secret123!").unwrap();
    assert!(!store.verify("mallory", "Secret123!"));
    assert!(!store.verify("alice", ""));
    assert!(!store.verify("", ""));
}

#[test]
fn unknown_user_and_wrong_password_are_indistinguishable() {
    let store = store();
    store.register("alice", "Secret123!").unwrap();

    let unknown = store.authenticate("nobody", "Secret123!").unwrap();
    let wrong = store.authenticate("alice", "WrongPass").unwrap();
    assert!(unknown.is_none());
    assert!(wrong.is_none());
}

#[test]
fn authenticate_returns_key_material_inputs() {
    let (_temp, backend, store) = file_store();
    store.register("alice", "Secret123!").unwrap();

    let verified = store.authenticate("alice", "Secret123!").unwrap().unwrap();
    assert_eq!(verified.username(), "alice");

    let records = backend.load().unwrap();
    assert_eq!(verified.key_salt(), &records["alice"].key_salt);

    let k1 = verified.derive_key("Secret123!").unwrap();
    let k2 = verified.derive_key("Secret123!").unwrap();
    assert_eq!(k1.as_bytes(), k2.as_bytes());
}

fn average_verify_time(store: &CredentialStore, username: &str) -> Duration {
    const ROUNDS: u32 = 3;
    let start = Instant::now();
    for _ in 0..ROUNDS {
        assert!(!store.verify(username, "WrongPass"));
    }
    start.elapsed() / ROUNDS
}

#[test]
fn unknown_user_costs_as_much_as_a_record_with_older_params() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("users.json");
    let strong = KdfParams {
        memory_cost: 16 * 1024,
        time_cost: 2,
        parallelism: 1,
    };
    CredentialStore::open(&path, strong)
        .register("alice", "Secret123!")
        .unwrap();

    // Defaults retuned far below what alice's record was created with.
    let store = CredentialStore::open(&path, test_params());
    let known = average_verify_time(&store, "alice");
    let unknown = average_verify_time(&store, "mallory");

    assert!(
        unknown * 4 >= known && known * 4 >= unknown,
        "known user {known:?} vs unknown user {unknown:?}"
    );
}

#[test]
fn usernames_are_sorted() {
    let store = store();
    store.register("carol", "pw").unwrap();
    store.register("alice", "pw").unwrap();
    store.register("bob", "pw").unwrap();
    assert_eq!(store.usernames().unwrap(), vec!["alice", "bob", "carol"]);
}

// ── JSON file backend ────────────────────────────────────────────

#[test]
fn file_backend_persists_across_instances() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("users.json");

    CredentialStore::open(&path, test_params())
        .register("alice", "Secret123!")
        .unwrap();
    assert!(path.exists());

    let reopened = CredentialStore::open(&path, test_params());
    assert!(reopened.verify("alice", "Secret123!"));
}

#[test]
fn file_backend_missing_file_is_empty() {
    let temp = TempDir::new().unwrap();
    let backend = JsonFileBackend::new(temp.path().join("absent.json"));
    assert!(backend.load().unwrap().is_empty());
}

#[test]
fn file_backend_creates_parent_directories() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("dir").join("users.json");
    CredentialStore::open(&path, test_params())
        .register("alice", "pw")
        .unwrap();
    assert!(path.exists());
}

#[test]
fn file_backend_writes_no_plaintext() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("users.json");
    CredentialStore::open(&path, test_params())
        .register("alice", "Secret123!")
        .unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("alice"));
    assert!(contents.contains("password_hash"));
    assert!(contents.contains("key_salt"));
    assert!(!contents.contains("Secret123!"));
}

#[test]
fn corrupt_file_fails_closed() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("users.json");
    let store = CredentialStore::open(&path, test_params());
    store.register("alice", "Secret123!").unwrap();

    std::fs::write(&path, b"{ not json").unwrap();

    assert!(!store.verify("alice", "Secret123!"));
    assert!(matches!(
        store.authenticate("alice", "Secret123!"),
        Err(AuthError::Corrupt(_))
    ));
    assert!(matches!(
        store.register("bob", "pw"),
        Err(AuthError::Corrupt(_))
    ));
}

#[test]
fn unreadable_store_is_storage_error() {
    let temp = TempDir::new().unwrap();
    // A directory where the file should be cannot be read as a file.
    let path = temp.path().join("users.json");
    std::fs::create_dir(&path).unwrap();

    let store = CredentialStore::open(&path, test_params());
    assert!(!store.verify("alice", "pw"));
    assert!(matches!(
        store.authenticate("alice", "pw"),
        Err(AuthError::Storage(_))
    ));
}

#[test]
fn external_edits_are_seen() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("users.json");

    let writer = CredentialStore::open(&path, test_params());
    let reader = CredentialStore::open(&path, test_params());
    assert!(!reader.verify("alice", "pw"));

    writer.register("alice", "pw").unwrap();
    assert!(reader.verify("alice", "pw"));
}

#[test]
fn memory_backend_roundtrip() {
    let backend = MemoryBackend::new();
    assert!(backend.load().unwrap().is_empty());

    let store = CredentialStore::new(Box::new(backend), test_params());
    store.register("alice", "pw").unwrap();
    assert_eq!(store.usernames().unwrap(), vec!["alice"]);
}

#[test]
fn concurrent_signups_across_instances_are_all_kept() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("users.json");

    // Separate stores share nothing in memory, like separate processes.
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let path: PathBuf = path.clone();
            thread::spawn(move || {
                CredentialStore::open(path, test_params())
                    .register(&format!("user{i}"), "pw")
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let store = CredentialStore::open(&path, test_params());
    assert_eq!(store.usernames().unwrap().len(), 8);
    assert!(!JsonFileBackend::new(&path).lock_path().exists());
}

#[test]
fn concurrent_signups_on_one_store_are_all_kept() {
    let store = Arc::new(store());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || store.register(&format!("user{i}"), "pw").unwrap())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(store.usernames().unwrap().len(), 8);
}

#[test]
fn held_lock_file_blocks_signup_until_removed() {
    let temp = TempDir::new().unwrap();
    let backend = JsonFileBackend::new(temp.path().join("users.json"))
        .with_lock_timeout(Duration::from_millis(50));
    let lock = backend.lock_path();
    std::fs::write(&lock, b"").unwrap();

    let store = CredentialStore::new(Box::new(backend), test_params());
    assert!(matches!(
        store.register("alice", "pw"),
        Err(AuthError::Storage(ref msg)) if msg.contains(".lock")
    ));
    assert!(store.usernames().unwrap().is_empty());

    std::fs::remove_file(&lock).unwrap();
    store.register("alice", "pw").unwrap();
    assert!(store.verify("alice", "pw"));
    assert!(!lock.exists());
}

// ── Errors ───────────────────────────────────────────────────────

#[test]
fn storage_and_auth_errors_read_differently() {
    let storage = format!("{}", AuthError::Storage("disk full".into()));
    let corrupt = format!("{}", AuthError::Corrupt("bad json".into()));
    assert!(storage.contains("disk full"));
    assert!(corrupt.contains("corrupt"));
    assert!(!storage.contains("password"));
    assert!(!corrupt.contains("password"));
}
