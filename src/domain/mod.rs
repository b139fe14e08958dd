//! Storefront domain: aggregates, value objects and the pure helpers the
//! repositories and client stores share.

pub mod aggregates;
pub mod calculator;
pub mod grouping;
pub mod value_objects;

pub use aggregates::*;
pub use grouping::{derive_group, GROUP_TOKENS_V1};
