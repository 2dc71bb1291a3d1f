//! Behavior under concurrent writers.

use crate::common::{fact, store};
use factstore::{AppendCondition, FactStoreError, Position, SubjectRef};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

#[test]
fn concurrent_appends_to_distinct_subjects_all_commit() {
    let store = Arc::new(store());
    let writers = 8;
    let per_writer = 20;

    let handles: Vec<_> = (0..writers)
        .map(|w| {
            let store = store.clone();
            thread::spawn(move || {
                let subject = SubjectRef::new("user", format!("u{w}"));
                let mut positions = Vec::with_capacity(per_writer);
                for i in 0..per_writer {
                    let f = fact(&subject, &format!("T{i}"));
                    positions.push(store.append(&[f], &AppendCondition::None).unwrap());
                }
                positions
            })
        })
        .collect();

    let mut all: Vec<Position> = Vec::new();
    for handle in handles {
        all.extend(handle.join().unwrap());
    }

    // Every append got a distinct position.
    let unique: HashSet<Position> = all.iter().copied().collect();
    assert_eq!(unique.len(), writers * per_writer);

    for w in 0..writers {
        let subject = SubjectRef::new("user", format!("u{w}"));
        assert_eq!(store.find_by_subject(&subject).unwrap().len(), per_writer);
    }
}

#[test]
fn contending_optimistic_locks_admit_exactly_one_writer() {
    let store = Arc::new(store());
    let subject = SubjectRef::new("user", "contended");

    let head = fact(&subject, "CREATED");
    store.append(&[head.clone()], &AppendCondition::None).unwrap();

    let contenders = 6;
    let handles: Vec<_> = (0..contenders)
        .map(|_| {
            let store = store.clone();
            let subject = subject.clone();
            let expected = head.id;
            thread::spawn(move || {
                let lock = AppendCondition::expected_last_fact(subject.clone(), Some(expected));
                store.append(&[fact(&subject, "UPDATED")], &lock)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let won = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(won, 1);
    for result in results.iter().filter(|r| r.is_err()) {
        assert!(matches!(
            result,
            Err(FactStoreError::SubjectPreconditionFailed { .. })
        ));
    }

    // The winner's fact is the only addition.
    assert_eq!(store.find_by_subject(&subject).unwrap().len(), 2);
}

#[test]
fn global_order_is_consistent_after_concurrent_writes() {
    let store = Arc::new(store());
    let handles: Vec<_> = (0..4)
        .map(|w| {
            let store = store.clone();
            thread::spawn(move || {
                let subject = SubjectRef::new("user", format!("u{w}"));
                for i in 0..10 {
                    store
                        .append(&[fact(&subject, &format!("T{i}"))], &AppendCondition::None)
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let positions: Vec<Position> = store
        .stream_all()
        .map(|r| r.unwrap().position)
        .collect();
    assert_eq!(positions.len(), 40);
    for pair in positions.windows(2) {
        assert!(pair[0] < pair[1]);
    }
}

#[test]
fn reset_clears_the_store() {
    let store = store();
    let subject = SubjectRef::new("user", "u1");
    let f = fact(&subject, "A").with_tag("k", "v");
    store.append(&[f.clone()], &AppendCondition::None).unwrap();

    store.reset().unwrap();

    assert!(!store.exists_by_id(&f.id));
    assert!(store.find_by_subject(&subject).unwrap().is_empty());
    assert_eq!(store.stream_all().count(), 0);

    // The store keeps working after a reset.
    store.append(&[fact(&subject, "B")], &AppendCondition::None).unwrap();
    assert_eq!(store.find_by_subject(&subject).unwrap().len(), 1);
}
