//! Library half of the demo binary: the in-memory tick store and the
//! in-process wire stub, reusable from the end-to-end scenario tests
//! alongside `main.rs`.

pub mod tick_store;
pub mod wire_stub;
