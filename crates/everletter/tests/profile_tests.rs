//! Profile setup, username rules, search and avatars through the wired app.

mod common;

use common::TestHarness;
use everletter::{EverletterError, ProfileUpdate, StorageError, UsernameError};

/// A single username test case for signup.
struct UsernameTestCase {
    name: &'static str,
    username: &'static str,
    /// Expected error message, `None` when signup should succeed.
    expected_error: Option<&'static str>,
}

const USERNAME_TESTS: &[UsernameTestCase] = &[
    UsernameTestCase {
        name: "valid",
        username: "new_user_1",
        expected_error: None,
    },
    UsernameTestCase {
        name: "min_length",
        username: "abc",
        expected_error: None,
    },
    UsernameTestCase {
        name: "max_length",
        username: "abcdefghij0123456789",
        expected_error: None,
    },
    UsernameTestCase {
        name: "too_short",
        username: "ab",
        expected_error: Some("Username must be at least 3 characters long"),
    },
    UsernameTestCase {
        name: "too_long",
        username: "abcdefghij0123456789x",
        expected_error: Some("Username cannot be longer than 20 characters"),
    },
    UsernameTestCase {
        name: "hyphen",
        username: "new-user",
        expected_error: Some("Username can only contain letters, numbers, and underscores"),
    },
    UsernameTestCase {
        name: "duplicate_different_case",
        username: "Anna",
        expected_error: Some("Username is already taken"),
    },
];

#[test]
fn test_signup_username_rules() {
    for (i, case) in USERNAME_TESTS.iter().enumerate() {
        let h = TestHarness::new();
        h.register("existing", "anna");

        h.sign_in(&format!("user-{}", i));
        let result = h.app.profiles.create_profile(case.username, "");
        match case.expected_error {
            None => {
                let profile = result.unwrap_or_else(|e| panic!("case '{}': {}", case.name, e));
                assert_eq!(profile.username, case.username, "case '{}'", case.name);
            }
            Some(expected) => {
                let err = result.expect_err(case.name);
                assert_eq!(err.to_string(), expected, "case '{}'", case.name);
            }
        }
    }
}

#[test]
fn test_format_error_precedes_uniqueness() {
    let h = TestHarness::new();
    h.register("u1", "anna");
    h.sign_in("u2");
    assert!(matches!(
        h.app.profiles.create_profile("an", ""),
        Err(EverletterError::InvalidUsername(UsernameError::TooShort))
    ));
}

#[test]
fn test_rename_and_lookup() {
    let h = TestHarness::new();
    h.register("u1", "anna");
    h.app
        .profiles
        .update_profile(ProfileUpdate {
            username: Some("anna_k".to_string()),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(h.app.profiles.get_profile_by_username("ANNA_K").unwrap().id, "u1");
    assert!(h.app.profiles.is_username_available("anna").unwrap());
    assert!(!h.app.profiles.is_username_available("anna_k").unwrap());
}

#[test]
fn test_search_users_respects_limit() {
    let h = TestHarness::with_config(|c| c.search(2, 2));
    for (id, name) in [("u1", "reader_a"), ("u2", "reader_b"), ("u3", "reader_c")] {
        h.register(id, name);
    }

    let found = h.app.profiles.search_users("READER").unwrap();
    let names: Vec<_> = found.iter().map(|p| p.username.as_str()).collect();
    assert_eq!(names, vec!["reader_a", "reader_b"]);
    assert!(h.app.profiles.search_users("r").unwrap().is_empty());
    assert!(h.app.profiles.search_users("%").unwrap().is_empty());
}

#[test]
fn test_batch_lookups() {
    let h = TestHarness::new();
    h.register("u1", "anna");
    h.register("u2", "luke");

    let by_ids = h
        .app
        .profiles
        .get_profiles_by_ids(&["u1".to_string(), "missing".to_string()])
        .unwrap();
    assert_eq!(by_ids.len(), 1);

    let by_names = h
        .app
        .profiles
        .get_profiles_by_usernames(&["anna".to_string(), "luke".to_string()])
        .unwrap();
    assert_eq!(by_names.len(), 2);
}

#[test]
fn test_avatar_lifecycle() {
    let h = TestHarness::with_config(|c| c.max_avatar_bytes(8));
    h.register("u1", "anna");

    let url = h.app.profiles.upload_avatar("face.jpg", b"jpeg").unwrap();
    assert!(url.starts_with("https://cdn.example.com/storage/avatars/u1-"));
    assert!(h.temp_path().join("objects").join("avatars").is_dir());

    assert!(matches!(
        h.app.profiles.upload_avatar("face.png", b"too many bytes"),
        Err(EverletterError::Storage(StorageError::TooLarge { .. }))
    ));

    h.register("u2", "luke");
    assert!(matches!(
        h.app.profiles.delete_avatar(&url),
        Err(EverletterError::Storage(StorageError::NotOwner))
    ));

    h.sign_in("u1");
    h.app.profiles.delete_avatar(&url).unwrap();
}

#[test]
fn test_needs_profile_setup_for_placeholder_username() {
    let h = TestHarness::new();
    h.sign_in("u1");
    assert!(h.app.profiles.needs_profile_setup());

    h.register("u1", "anna");
    assert!(!h.app.profiles.needs_profile_setup());
}
