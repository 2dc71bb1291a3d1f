//! The query algebra and the other read paths.

use crate::common::{fact, store, subject};
use chrono::{TimeZone, Utc};
use factstore::{AppendCondition, Fact, FactId, FactStore, Tag, TagQuery, TagQueryItem};

/// The three-fact fixture the algebra tests share:
///
/// - `f1`: type `A`, tag `k1=v1`
/// - `f2`: type `B`, tags `k1=v1` and `k2=v2`
/// - `f3`: type `B`, tag `k2=v2`
fn algebra_fixture() -> (FactStore, Fact, Fact, Fact) {
    let store = store();
    let subject = subject("u1");
    let f1 = fact(&subject, "A").with_tag("k1", "v1");
    let f2 = fact(&subject, "B").with_tag("k1", "v1").with_tag("k2", "v2");
    let f3 = fact(&subject, "B").with_tag("k2", "v2");
    for f in [&f1, &f2, &f3] {
        store.append(&[f.clone()], &AppendCondition::None).unwrap();
    }
    (store, f1, f2, f3)
}

fn ids(facts: &[Fact]) -> Vec<FactId> {
    facts.iter().map(|f| f.id).collect()
}

#[test]
fn tag_only_item_is_or_across_tags() {
    let (store, f1, f2, f3) = algebra_fixture();
    let query = TagQuery::single(
        TagQueryItem::tags(vec![Tag::new("k1", "v1"), Tag::new("k2", "v2")]).unwrap(),
    );
    let found = store.find_by_tag_query(&query).unwrap();
    assert_eq!(ids(&found), vec![f1.id, f2.id, f3.id]);
}

#[test]
fn type_with_tags_is_and_across_tags() {
    let (store, _, f2, _) = algebra_fixture();
    let query = TagQuery::single(
        TagQueryItem::types_and_tags(
            vec!["B".into()],
            vec![Tag::new("k1", "v1"), Tag::new("k2", "v2")],
        )
        .unwrap(),
    );
    let found = store.find_by_tag_query(&query).unwrap();
    assert_eq!(ids(&found), vec![f2.id]);
}

#[test]
fn type_only_item_is_or_across_types() {
    let (store, f1, f2, f3) = algebra_fixture();

    let just_a = TagQuery::single(TagQueryItem::types(vec!["A".into()]).unwrap());
    assert_eq!(ids(&store.find_by_tag_query(&just_a).unwrap()), vec![f1.id]);

    let both = TagQuery::single(TagQueryItem::types(vec!["A".into(), "B".into()]).unwrap());
    assert_eq!(
        ids(&store.find_by_tag_query(&both).unwrap()),
        vec![f1.id, f2.id, f3.id]
    );
}

#[test]
fn untyped_item_with_tags_is_or_across_tags() {
    let (store, f1, f2, f3) = algebra_fixture();
    // With no type restriction the tags broaden like a tag-only item:
    // f1 carries only k1=v1 and must still match.
    let query = TagQuery::single(
        TagQueryItem::types_and_tags(
            vec![],
            vec![Tag::new("k1", "v1"), Tag::new("k2", "v2")],
        )
        .unwrap(),
    );
    let found = store.find_by_tag_query(&query).unwrap();
    assert_eq!(ids(&found), vec![f1.id, f2.id, f3.id]);
}

#[test]
fn multiple_items_union_their_results() {
    let (store, f1, f2, f3) = algebra_fixture();
    let query = TagQuery::new(vec![
        TagQueryItem::types(vec!["A".into()]).unwrap(),
        TagQueryItem::types_and_tags(vec!["B".into()], vec![Tag::new("k2", "v2")]).unwrap(),
    ]);
    let found = store.find_by_tag_query(&query).unwrap();
    // Union, deduplicated, sorted by position.
    assert_eq!(ids(&found), vec![f1.id, f2.id, f3.id]);
}

#[test]
fn overlapping_items_do_not_duplicate_results() {
    let (store, f1, f2, _) = algebra_fixture();
    let query = TagQuery::new(vec![
        TagQueryItem::tags(vec![Tag::new("k1", "v1")]).unwrap(),
        TagQueryItem::tags(vec![Tag::new("k1", "v1")]).unwrap(),
    ]);
    let found = store.find_by_tag_query(&query).unwrap();
    assert_eq!(ids(&found), vec![f1.id, f2.id]);
}

#[test]
fn empty_query_matches_nothing() {
    let (store, ..) = algebra_fixture();
    let found = store.find_by_tag_query(&TagQuery::new(vec![])).unwrap();
    assert!(found.is_empty());
}

#[test]
fn repeated_reads_are_idempotent() {
    let (store, ..) = algebra_fixture();
    let query = TagQuery::single(TagQueryItem::tags(vec![Tag::new("k1", "v1")]).unwrap());
    let first = store.find_by_tag_query(&query).unwrap();
    let second = store.find_by_tag_query(&query).unwrap();
    assert_eq!(first, second);
}

#[test]
fn find_by_tags_is_or_across_pairs() {
    let (store, f1, f2, f3) = algebra_fixture();
    let found = store
        .find_by_tags(&[("k1".into(), "v1".into()), ("k2".into(), "v2".into())])
        .unwrap();
    assert_eq!(ids(&found), vec![f1.id, f2.id, f3.id]);
}

#[test]
fn find_by_subject_returns_history_in_position_order() {
    let store = store();
    let ours = subject("u1");
    let theirs = subject("u2");

    let a = fact(&ours, "A");
    let noise = fact(&theirs, "X");
    let b = fact(&ours, "B");
    for f in [&a, &noise, &b] {
        store.append(&[f.clone()], &AppendCondition::None).unwrap();
    }

    let history = store.find_by_subject(&ours).unwrap();
    assert_eq!(ids(&history), vec![a.id, b.id]);
    assert!(store.find_by_subject(&subject("u3")).unwrap().is_empty());
}

#[test]
fn time_range_is_start_inclusive_end_exclusive() {
    let store = store();
    let subject = subject("u1");
    let t1 = Utc.timestamp_opt(1_000, 0).unwrap();
    let t2 = Utc.timestamp_opt(2_000, 0).unwrap();
    let t3 = Utc.timestamp_opt(3_000, 0).unwrap();

    let early = fact(&subject, "A").with_appended_at(t1);
    let mid = fact(&subject, "B").with_appended_at(t2);
    let late = fact(&subject, "C").with_appended_at(t3);
    for f in [&early, &mid, &late] {
        store.append(&[f.clone()], &AppendCondition::None).unwrap();
    }

    let found = store.find_in_time_range(&t2, &t3).unwrap();
    assert_eq!(ids(&found), vec![mid.id]);

    let all = store
        .find_in_time_range(&t1, &Utc.timestamp_opt(4_000, 0).unwrap())
        .unwrap();
    assert_eq!(ids(&all), vec![early.id, mid.id, late.id]);
}
