//! Lazily refreshed OAuth 2.0 access-token cache for the Zoho Bookings API.
//!
//! [`TokenCache`](cache::TokenCache) owns a single bearer token obtained through the
//! `refresh_token` grant. Callers ask for a token with
//! [`get_token`](cache::TokenCache::get_token); the cache answers from memory while the token
//! is outside its safety margin and performs exactly one exchange against the accounts
//! server otherwise. Time is read through an injected [`Clock`](clock::Clock) so expiry can be
//! driven deterministically.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod signer;

pub use cache::TokenCache;
#[cfg(feature = "reqwest")] pub use cache::ReqwestTokenCache;
pub use config::ClientConfig;
pub use error::{Error, Result};

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::Deserialize;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
