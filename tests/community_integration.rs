//! Community integration tests over the `SQLite` relational store.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use symphony::config::SymphonyConfig;
use symphony::models::User;
use symphony::services::{Services, StoreFactory};
use symphony::Error;
use tempfile::TempDir;

fn services(dir: &TempDir) -> Services {
    let config = SymphonyConfig::new().with_data_dir(dir.path());
    let services = StoreFactory::create_services(&config).expect("Failed to create services");
    for name in ["alice", "bob", "carol"] {
        services
            .social
            .create_user(&User::new(name, name, format!("{name}@example.com")))
            .unwrap();
    }
    services
}

#[test]
fn test_membership_both_ways() {
    let dir = TempDir::new().unwrap();
    let s = services(&dir);

    let jazz = s.communities.create_community("jazz-club", "Standards").unwrap();
    assert!(jazz.id.is_some());
    s.communities.create_community("rock-club", "").unwrap();

    s.communities.add_user_to_community("alice", "jazz-club").unwrap();
    s.communities.add_user_to_community("bob", "jazz-club").unwrap();
    s.communities.add_user_to_community("alice", "rock-club").unwrap();

    let members: Vec<String> = s
        .communities
        .list_users_from_community("jazz-club")
        .unwrap()
        .into_iter()
        .map(|u| u.username)
        .collect();
    assert_eq!(members.len(), 2);
    assert!(members.contains(&"alice".to_string()));
    assert!(members.contains(&"bob".to_string()));

    let mut of_alice: Vec<String> = s
        .communities
        .list_communities_of_user("alice")
        .unwrap()
        .into_iter()
        .map(|c| c.community_name)
        .collect();
    of_alice.sort();
    assert_eq!(of_alice, vec!["jazz-club", "rock-club"]);

    assert!(s.communities.list_communities_of_user("carol").unwrap().is_empty());
}

#[test]
fn test_missing_records() {
    let dir = TempDir::new().unwrap();
    let s = services(&dir);
    s.communities.create_community("jazz-club", "").unwrap();

    assert!(
        s.communities
            .add_user_to_community("ghost", "jazz-club")
            .unwrap_err()
            .is_not_found()
    );
    let err = s
        .communities
        .add_user_to_community("alice", "polka")
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { entity: "community", .. }));
    assert!(s.communities.list_users_from_community("polka").unwrap_err().is_not_found());
}

#[test]
fn test_duplicates_are_rejected() {
    let dir = TempDir::new().unwrap();
    let s = services(&dir);
    s.communities.create_community("jazz-club", "").unwrap();

    assert!(s.communities.create_community("jazz-club", "again").is_err());

    s.communities.add_user_to_community("alice", "jazz-club").unwrap();
    assert!(matches!(
        s.communities.add_user_to_community("alice", "jazz-club"),
        Err(Error::OperationFailed { .. })
    ));
    assert_eq!(s.communities.list_users_from_community("jazz-club").unwrap().len(), 1);
}
