//! Shared end-to-end test scaffolding: an isolated Store per test plus
//! fixture builders for the domain entities, mirroring the way the teacher
//! crate's test harness isolates a `TestDatabaseManager` per test.

pub mod harness;
pub mod mocks;
