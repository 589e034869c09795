//! Business-day calendar, bin analytic engine, COOL bookkeeping, and the
//! item-name/bin-declaration grammars.
//!
//! This crate has no wire awareness of its own — it consumes
//! [`mdp_types`] shapes and the [`tick_store::TickStoreAdapter`] trait, and
//! produces [`mdp_types::BinResult`]s and COOL availability records.

pub mod calendar;
pub mod cool;
pub mod engine;
pub mod errors;
pub mod item_name;
pub mod rounding;
pub mod tick_store;

pub use cool::CoolRegistry;
pub use engine::compute;
pub use errors::CoreError;
pub use item_name::{parse as parse_item_name, ParsedItemName};
pub use tick_store::TickStoreAdapter;
