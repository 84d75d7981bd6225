//! The credential stored in the cache slot and its freshness rules.

// self
use crate::{_prelude::*, auth::TokenSecret, error::RefreshError};

/// Lifecycle status of a cached credential relative to a safety margin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialStatus {
	/// The token may be handed out.
	Fresh,
	/// The token has not expired yet but is inside the safety margin.
	Expiring,
	/// The token is past its expiry instant.
	Expired,
}

/// Bearer token paired with the instant it stops being valid.
///
/// The pair is always written as one value, so a reader never sees the token from one
/// exchange with the expiry of another.
#[derive(Clone, PartialEq, Eq)]
pub struct CachedCredential {
	/// Access token secret; callers must avoid logging it.
	pub token: TokenSecret,
	/// Instant the exchange completed.
	pub issued_at: OffsetDateTime,
	/// `issued_at` plus the provider-reported lifetime.
	pub expires_at: OffsetDateTime,
}
impl CachedCredential {
	/// Builds a credential from an exchange that completed at `issued_at` and reported a
	/// lifetime of `lifetime_secs` seconds.
	pub fn issue(
		token: impl Into<TokenSecret>,
		issued_at: OffsetDateTime,
		lifetime_secs: u64,
	) -> Result<Self, RefreshError> {
		let token = token.into();

		if token.is_blank() {
			return Err(RefreshError::EmptyAccessToken);
		}
		if lifetime_secs == 0 {
			return Err(RefreshError::NonPositiveExpiresIn);
		}

		let lifetime =
			i64::try_from(lifetime_secs).map_err(|_| RefreshError::ExpiresInOutOfRange)?;
		let expires_at = issued_at
			.checked_add(Duration::seconds(lifetime))
			.ok_or(RefreshError::ExpiresInOutOfRange)?;

		Ok(Self { token, issued_at, expires_at })
	}

	/// Computes the status at `instant`, treating the last `margin` before expiry as
	/// [`CredentialStatus::Expiring`].
	pub fn status_at(&self, instant: OffsetDateTime, margin: Duration) -> CredentialStatus {
		if instant >= self.expires_at {
			return CredentialStatus::Expired;
		}

		match self.expires_at.checked_sub(margin) {
			Some(deadline) if instant < deadline => CredentialStatus::Fresh,
			_ => CredentialStatus::Expiring,
		}
	}

	/// Returns `true` while `instant < expires_at - margin`.
	pub fn is_fresh_at(&self, instant: OffsetDateTime, margin: Duration) -> bool {
		matches!(self.status_at(instant, margin), CredentialStatus::Fresh)
	}

	/// Time left before expiry at `instant`; negative once expired.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		self.expires_at - instant
	}
}
impl Debug for CachedCredential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CachedCredential")
			.field("token", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	const MARGIN: Duration = Duration::seconds(60);

	fn credential() -> CachedCredential {
		CachedCredential::issue("tok_abc", macros::datetime!(2025-01-01 00:00 UTC), 3600)
			.expect("Credential fixture should be valid.")
	}

	#[test]
	fn issue_derives_expiry_from_lifetime() {
		let credential = credential();

		assert_eq!(credential.expires_at, macros::datetime!(2025-01-01 01:00 UTC));
		assert_eq!(
			credential.remaining_at(macros::datetime!(2025-01-01 00:30 UTC)),
			Duration::minutes(30)
		);
	}

	#[test]
	fn status_respects_safety_margin() {
		let credential = credential();

		assert_eq!(
			credential.status_at(macros::datetime!(2025-01-01 00:58:59 UTC), MARGIN),
			CredentialStatus::Fresh
		);
		assert_eq!(
			credential.status_at(macros::datetime!(2025-01-01 00:59 UTC), MARGIN),
			CredentialStatus::Expiring
		);
		assert_eq!(
			credential.status_at(macros::datetime!(2025-01-01 01:00 UTC), MARGIN),
			CredentialStatus::Expired
		);
		assert!(credential.is_fresh_at(macros::datetime!(2025-01-01 00:59 UTC), Duration::ZERO));
	}

	#[test]
	fn margin_longer_than_lifetime_is_never_fresh() {
		let credential =
			CachedCredential::issue("short", macros::datetime!(2025-01-01 00:00 UTC), 30)
				.expect("Short-lived credential should still build.");

		assert!(!credential.is_fresh_at(macros::datetime!(2025-01-01 00:00 UTC), MARGIN));
	}

	#[test]
	fn issue_rejects_degenerate_responses() {
		let now = macros::datetime!(2025-01-01 00:00 UTC);

		assert!(matches!(
			CachedCredential::issue("  ", now, 3600),
			Err(RefreshError::EmptyAccessToken)
		));
		assert!(matches!(
			CachedCredential::issue("tok", now, 0),
			Err(RefreshError::NonPositiveExpiresIn)
		));
		assert!(matches!(
			CachedCredential::issue("tok", now, u64::MAX),
			Err(RefreshError::ExpiresInOutOfRange)
		));
	}

	#[test]
	fn debug_output_redacts_token() {
		let rendered = format!("{:?}", credential());

		assert!(rendered.contains("<redacted>"));
		assert!(!rendered.contains("tok_abc"));
	}
}
