//! Wallpaper storefront data layer
//!
//! Orders, catalog, favorites and collections kept in a key-value store
//! reached over REST, served through an axum API, and consumed by client
//! stores that fall back to an on-device mirror.
//!
//! ## Layout
//! - `kv`: the key-value adapter and an in-memory double
//! - `domain`: aggregates and pure helpers (grouping, roll calculator)
//! - `repository`: server-side repositories over the KV store
//! - `api`: the `/api/...` routes
//! - `client`: per-domain client stores

pub mod api;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod kv;
pub mod repository;

pub use error::{ClientError, ClientResult, Result, StoreError};
