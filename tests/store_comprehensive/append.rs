//! Append atomicity, positions, and duplicate-id handling.

use crate::common::{fact, store, subject};
use factstore::{AppendCondition, FactStoreError, Position};

#[test]
fn empty_batch_is_rejected() {
    let store = store();
    let result = store.append(&[], &AppendCondition::None);
    assert_eq!(result, Err(FactStoreError::EmptyBatch));
}

#[test]
fn append_returns_position_of_last_fact_in_batch() {
    let store = store();
    let subject = subject("u1");
    let batch = vec![
        fact(&subject, "A"),
        fact(&subject, "B"),
        fact(&subject, "C"),
    ];

    let position = store.append(&batch, &AppendCondition::None).unwrap();
    assert_eq!(position.batch, 2);

    let last = store.find_by_id(&batch[2].id).unwrap().unwrap();
    assert_eq!(last.position, position);
}

#[test]
fn positions_strictly_increase_across_appends() {
    let store = store();
    let subject = subject("u1");

    let mut positions: Vec<Position> = Vec::new();
    for i in 0..5 {
        let f = fact(&subject, &format!("T{i}"));
        positions.push(store.append(&[f], &AppendCondition::None).unwrap());
    }

    for pair in positions.windows(2) {
        assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
    }
}

#[test]
fn batch_members_share_commit_and_order_by_batch_index() {
    let store = store();
    let subject = subject("u1");
    let batch = vec![fact(&subject, "A"), fact(&subject, "B")];
    store.append(&batch, &AppendCondition::None).unwrap();

    let first = store.find_by_id(&batch[0].id).unwrap().unwrap().position;
    let second = store.find_by_id(&batch[1].id).unwrap().unwrap().position;
    assert_eq!(first.commit, second.commit);
    assert_eq!(first.batch, 0);
    assert_eq!(second.batch, 1);
}

#[test]
fn duplicate_id_rejects_the_whole_batch() {
    let store = store();
    let subject = subject("u1");

    let existing = fact(&subject, "A");
    store.append(&[existing.clone()], &AppendCondition::None).unwrap();

    let fresh = fact(&subject, "B");
    let duplicate = fact(&subject, "C").with_id(existing.id);
    let result = store.append(&[fresh.clone(), duplicate], &AppendCondition::None);

    assert_eq!(
        result,
        Err(FactStoreError::DuplicateFactIds {
            ids: vec![existing.id]
        })
    );
    // Atomicity: the fresh fact must not have been written either.
    assert!(!store.exists_by_id(&fresh.id));
    assert_eq!(store.find_by_subject(&subject).unwrap().len(), 1);
}

#[test]
fn duplicates_within_a_single_batch_are_rejected() {
    let store = store();
    let subject = subject("u1");

    let original = fact(&subject, "A");
    let repeat = fact(&subject, "B").with_id(original.id);
    let result = store.append(&[original.clone(), repeat], &AppendCondition::None);

    assert_eq!(
        result,
        Err(FactStoreError::DuplicateFactIds {
            ids: vec![original.id]
        })
    );
    assert!(!store.exists_by_id(&original.id));
}

#[test]
fn duplicate_error_lists_every_colliding_id() {
    let store = store();
    let subject = subject("u1");

    let a = fact(&subject, "A");
    let b = fact(&subject, "B");
    store.append(&[a.clone(), b.clone()], &AppendCondition::None).unwrap();

    let dup_a = fact(&subject, "C").with_id(a.id);
    let dup_b = fact(&subject, "D").with_id(b.id);
    let fresh = fact(&subject, "E");
    let result = store.append(&[dup_a, fresh, dup_b], &AppendCondition::None);

    match result {
        Err(FactStoreError::DuplicateFactIds { ids }) => {
            assert_eq!(ids, vec![a.id, b.id]);
        }
        other => panic!("expected DuplicateFactIds, got {other:?}"),
    }
}

#[test]
fn exists_by_id_is_deterministic_after_a_failed_batch() {
    let store = store();
    let subject = subject("u1");

    let existing = fact(&subject, "A");
    store.append(&[existing.clone()], &AppendCondition::None).unwrap();

    let fresh = fact(&subject, "B");
    let duplicate = fact(&subject, "C").with_id(existing.id);
    for _ in 0..3 {
        let result = store.append(&[fresh.clone(), duplicate.clone()], &AppendCondition::None);
        assert!(result.is_err());
        assert!(store.exists_by_id(&existing.id));
        assert!(!store.exists_by_id(&fresh.id));
    }
}

#[test]
fn find_by_id_returns_none_for_unknown_id() {
    let store = store();
    let ghost = fact(&subject("u1"), "A");
    assert_eq!(store.find_by_id(&ghost.id).unwrap(), None);
    assert!(!store.exists_by_id(&ghost.id));
}

#[test]
fn stored_fact_roundtrips_payload_tags_and_metadata() {
    let store = store();
    let subject = subject("u1");
    let original = fact(&subject, "USER_ONBOARDED")
        .with_tag("username", "peter")
        .with_metadata("trace", "abc");

    store.append(&[original.clone()], &AppendCondition::None).unwrap();

    let stored = store.find_by_id(&original.id).unwrap().unwrap();
    assert_eq!(stored.fact, original);
}
