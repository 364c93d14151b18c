//! Integration tests
//!
//! `router_tests` drive the full router in-process against the in-memory
//! backend. `postgres_tests` need a database and `live_tests` a running
//! server; both are ignored by default.

mod live_tests;
mod postgres_tests;
mod router_tests;
