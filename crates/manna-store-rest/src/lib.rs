//! Hosted backend for Manna.
//!
//! [`RestStore`] speaks the PostgREST dialect used by hosted
//! backend-as-a-service platforms: table calls under `/rest/v1`, named
//! procedures under `/rest/v1/rpc`, and session lookup under `/auth/v1`.
//!
//! Two credential tiers exist. [`PublicClientConfig`] (base URL plus the
//! restricted anon key) is safe to hand to any client. [`ServiceKey`] is the
//! elevated key; it is only ever read from the server's environment, never
//! serialised, and redacted in logs.

mod query;
mod store;

pub mod config;
pub mod error;

pub use config::{PublicClientConfig, ServiceKey};
pub use error::{Error, Result};
pub use store::RestStore;
