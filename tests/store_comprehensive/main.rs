//! Comprehensive integration suite exercising the public facade:
//! append atomicity, duplicate handling, preconditions, the query
//! algebra, streaming, and behavior under concurrent writers.

mod common;

mod append;
mod concurrency;
mod queries;
mod scenario;
mod streams;
