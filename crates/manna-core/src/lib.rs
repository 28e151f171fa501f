//! Core types and trait definitions for Manna.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! holds the canonical schema every other crate speaks, the [`RemoteStore`]
//! seam behind which the hosted backend lives, and the fallback discipline
//! shared by all entity services.
//!
//! [`RemoteStore`]: store::RemoteStore

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
#![allow(async_fn_in_trait)]

pub mod channel;
pub mod daily;
pub mod devotional;
pub mod error;
pub mod event;
pub mod fallback;
pub mod notification;
pub mod plan;
pub mod profile;
pub mod referral;
pub mod social;
pub mod store;

pub use error::{Error, Result};
pub use fallback::{Fetched, fetch_with_fallback};
