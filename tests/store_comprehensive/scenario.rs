//! End-to-end subject lifecycle: five appends, each guarded by the
//! previous head, then full read-back over every query path.

use crate::common::store;
use factstore::{AppendCondition, Fact, FactId, SubjectRef, Tag, TagQuery, TagQueryItem};

#[test]
fn five_append_course_lifecycle() {
    let store = store();
    let course = SubjectRef::new("course", "rust-101");

    let steps: [(&str, &[u8]); 5] = [
        ("COURSE_DEFINED", br#"{"title":"Intro"}"#),
        ("COURSE_CAPACITY_CHANGED", br#"{"capacity":20}"#),
        ("COURSE_RENAMED", br#"{"title":"Rust Intro"}"#),
        ("COURSE_CAPACITY_CHANGED", br#"{"capacity":30}"#),
        ("COURSE_ARCHIVED", br#"{}"#),
    ];

    let mut head: Option<FactId> = None;
    let mut appended: Vec<Fact> = Vec::new();
    for (fact_type, payload) in steps {
        let fact = Fact::new(fact_type, payload.to_vec(), course.clone())
            .with_tag("course", "rust-101");
        let lock = AppendCondition::expected_last_fact(course.clone(), head);
        store.append(&[fact.clone()], &lock).unwrap();
        head = Some(fact.id);
        appended.push(fact);
    }

    // Subject history: all five, in append order.
    let history = store.find_by_subject(&course).unwrap();
    assert_eq!(history, appended);
    assert_eq!(store.last_fact_id(&course), head);

    // Point reads agree.
    for fact in &appended {
        assert!(store.exists_by_id(&fact.id));
        assert_eq!(store.find_by_id(&fact.id).unwrap().unwrap().fact, *fact);
    }

    // Type query picks out the two capacity changes, in order.
    let capacity = TagQuery::single(
        TagQueryItem::types(vec!["COURSE_CAPACITY_CHANGED".into()]).unwrap(),
    );
    let found = store.find_by_tag_query(&capacity).unwrap();
    assert_eq!(found, vec![appended[1].clone(), appended[3].clone()]);

    // Tag query sees the whole lifecycle.
    let tagged = TagQuery::single(
        TagQueryItem::tags(vec![Tag::new("course", "rust-101")]).unwrap(),
    );
    assert_eq!(store.find_by_tag_query(&tagged).unwrap(), appended);

    // Replay reproduces the same order with strictly increasing positions.
    let replayed: Vec<Fact> = store
        .stream_all()
        .map(|r| r.unwrap().fact)
        .collect();
    assert_eq!(replayed, appended);

    // A stale head is rejected once archived.
    let stale = AppendCondition::expected_last_fact(course.clone(), Some(appended[0].id));
    let result = store.append(
        &[Fact::new("COURSE_REOPENED", b"{}".to_vec(), course.clone())],
        &stale,
    );
    assert!(result.is_err());
    assert_eq!(store.find_by_subject(&course).unwrap().len(), 5);
}
