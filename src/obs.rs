//! Observability for cache operations.
//!
//! Every notable moment is described by one [`CacheEvent`] and handed to [`record`], which
//! fans it out to whichever backends are compiled in.
//!
//! # Feature Flags
//!
//! - `tracing` (on by default): spans named `zoho_token_cache.op` with `op` and `stage`
//!   fields, a debug event per hit, and info/warn events for refreshes and failures.
//! - `metrics`: the `zoho_token_cache_events_total` counter labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use tracing::{InstrumentedOp, OpSpan};

// self
use crate::_prelude::*;

/// Operations observed by the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheOp {
	/// A caller asked for a token.
	GetToken,
	/// The cache exchanged the refresh token for a new access token.
	Refresh,
}
impl CacheOp {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CacheOp::GetToken => "get_token",
			CacheOp::Refresh => "refresh",
		}
	}
}
impl Display for CacheOp {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Something worth counting or logging that happened inside the cache.
#[derive(Clone, Copy, Debug)]
pub enum CacheEvent<'a> {
	/// A token was served from the slot without I/O.
	Hit {
		/// Expiry of the served token.
		expires_at: OffsetDateTime,
	},
	/// A token exchange is about to be sent.
	RefreshStarted,
	/// A new token was stored in the slot.
	Refreshed {
		/// Expiry of the stored token.
		expires_at: OffsetDateTime,
	},
	/// An operation failed and its error is going back to the caller.
	Failed {
		/// Operation that failed.
		op: CacheOp,
		/// Error returned to the caller; its message never carries secrets.
		error: &'a Error,
	},
}
impl CacheEvent<'_> {
	/// Operation the event belongs to.
	pub fn op(&self) -> CacheOp {
		match self {
			Self::Hit { .. } => CacheOp::GetToken,
			Self::RefreshStarted | Self::Refreshed { .. } => CacheOp::Refresh,
			Self::Failed { op, .. } => *op,
		}
	}

	/// Stable outcome label for metrics.
	pub fn outcome(&self) -> &'static str {
		match self {
			Self::Hit { .. } => "hit",
			Self::RefreshStarted => "attempt",
			Self::Refreshed { .. } => "success",
			Self::Failed { .. } => "failure",
		}
	}
}

/// Records `event` on every enabled backend.
pub fn record(event: CacheEvent<'_>) {
	metrics::count(&event);
	tracing::emit(&event);
}
