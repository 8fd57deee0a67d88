//! Activity Source Tests
//!
//! Scripted source used by collector and aggregation unit tests.
