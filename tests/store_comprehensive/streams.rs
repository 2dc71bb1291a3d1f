//! Global-order replay streams.

use crate::common::{fact, store, subject};
use factstore::{AppendCondition, FactId, Position, StoredFact};

#[test]
fn stream_all_yields_every_fact_in_commit_order() {
    let store = store();
    let u1 = subject("u1");
    let u2 = subject("u2");

    let facts = vec![fact(&u1, "A"), fact(&u2, "B"), fact(&u1, "C")];
    for f in &facts {
        store.append(&[f.clone()], &AppendCondition::None).unwrap();
    }

    let streamed: Vec<StoredFact> = store.stream_all().map(Result::unwrap).collect();
    let ids: Vec<FactId> = streamed.iter().map(|s| s.fact.id).collect();
    assert_eq!(ids, facts.iter().map(|f| f.id).collect::<Vec<_>>());

    for pair in streamed.windows(2) {
        assert!(pair[0].position < pair[1].position);
    }
}

#[test]
fn stream_orders_batch_members_by_batch_index() {
    let store = store();
    let subject = subject("u1");
    let batch = vec![fact(&subject, "A"), fact(&subject, "B"), fact(&subject, "C")];
    store.append(&batch, &AppendCondition::None).unwrap();

    let streamed: Vec<StoredFact> = store.stream_all().map(Result::unwrap).collect();
    let batches: Vec<u32> = streamed.iter().map(|s| s.position.batch).collect();
    assert_eq!(batches, vec![0, 1, 2]);
}

#[test]
fn stream_after_is_exclusive() {
    let store = store();
    let subject = subject("u1");

    let a = fact(&subject, "A");
    let b = fact(&subject, "B");
    let cutoff = store.append(&[a], &AppendCondition::None).unwrap();
    store.append(&[b.clone()], &AppendCondition::None).unwrap();

    let streamed: Vec<StoredFact> = store.stream_after(cutoff).map(Result::unwrap).collect();
    let ids: Vec<FactId> = streamed.iter().map(|s| s.fact.id).collect();
    assert_eq!(ids, vec![b.id]);
}

#[test]
fn stream_after_the_latest_position_is_empty() {
    let store = store();
    let subject = subject("u1");
    let latest = store
        .append(&[fact(&subject, "A")], &AppendCondition::None)
        .unwrap();

    assert_eq!(store.stream_after(latest).count(), 0);
    assert_eq!(store.stream_after(Position::new(u64::MAX, 0)).count(), 0);
}

#[test]
fn stream_is_a_point_in_time_snapshot() {
    let store = store();
    let subject = subject("u1");
    store.append(&[fact(&subject, "A")], &AppendCondition::None).unwrap();

    let stream = store.stream_all();
    assert_eq!(stream.remaining_hint(), 1);

    // A fact committed after the stream was created is not observed.
    store.append(&[fact(&subject, "B")], &AppendCondition::None).unwrap();
    assert_eq!(stream.count(), 1);
}

#[test]
fn empty_store_streams_nothing() {
    let store = store();
    assert_eq!(store.stream_all().count(), 0);
}
