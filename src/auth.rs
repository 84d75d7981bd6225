//! Token models held by the cache: the redacting secret wrapper and the cached credential.

pub mod credential;
pub mod secret;

pub use credential::*;
pub use secret::*;
