//! Shared helpers for the integration suite.

use factstore::{Fact, FactStore, SubjectRef};
use std::sync::Once;

static TRACING: Once = Once::new();

pub fn store() -> FactStore {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
    FactStore::in_memory()
}

pub fn subject(id: &str) -> SubjectRef {
    SubjectRef::new("user", id)
}

pub fn fact(subject: &SubjectRef, fact_type: &str) -> Fact {
    Fact::new(fact_type, b"{}".to_vec(), subject.clone())
}
