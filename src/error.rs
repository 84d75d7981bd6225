//! Cache-level error types shared by configuration, transport, and token exchange.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Collaborators should surface both variants to end users as generic failures: neither
/// message ever contains a secret, but provider text is not meant for end users either.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem; not retryable without operator intervention.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The token exchange failed; safe to retry.
	#[error(transparent)]
	Refresh(#[from] RefreshError),
}
impl Error {
	/// Returns `true` when retrying the same call may succeed.
	pub fn is_retryable(&self) -> bool {
		matches!(self, Self::Refresh(_))
	}

	/// HTTP status reported by the token endpoint, when one was received.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Config(_) => None,
			Self::Refresh(e) => e.status(),
		}
	}
}
impl From<TransportError> for Error {
	fn from(e: TransportError) -> Self {
		Self::Refresh(RefreshError::Transport(e))
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required secret is absent or blank. Only the variable name is reported.
	#[error("Required secret `{name}` is not configured.")]
	MissingSecret {
		/// Environment variable that should carry the secret.
		name: &'static str,
	},
	/// Token endpoint cannot be parsed.
	#[error("Token endpoint `{value}` is not a valid URL.")]
	InvalidTokenEndpoint {
		/// Raw value that failed to parse.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Token endpoint uses plain HTTP on a non-loopback host.
	#[error("Token endpoint must use HTTPS: {url}.")]
	InsecureTokenEndpoint {
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Safety margin is not a non-negative whole number of seconds.
	#[error("Safety margin `{value}` must be a non-negative number of seconds.")]
	InvalidSafetyMargin {
		/// Raw value that failed validation.
		value: String,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Refresh failures. Every variant is retryable from the caller's point of view.
#[derive(Debug, ThisError)]
pub enum RefreshError {
	/// Token endpoint rejected the exchange, either with a non-success status or with an
	/// `error` field in the body.
	#[error("Token endpoint rejected the refresh: {message}.")]
	Provider {
		/// HTTP status code, when available.
		status: Option<u16>,
		/// OAuth `error` code, when the body carried one.
		code: Option<String>,
		/// Provider- or cache-supplied message summarizing the failure.
		message: String,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with JSON that does not match the expected shape.
	#[error("Token endpoint returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Response omitted `expires_in`.
	#[error("Token endpoint response is missing expires_in.")]
	MissingExpiresIn,
	/// Response carried a zero `expires_in`.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
	/// Response carried an `expires_in` the clock cannot represent.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Response carried an empty `access_token`.
	#[error("Token endpoint returned an empty access token.")]
	EmptyAccessToken,
	/// The request never produced a response.
	#[error(transparent)]
	Transport(#[from] TransportError),
}
impl RefreshError {
	/// HTTP status attached to the failure, when known.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Provider { status, .. } | Self::ResponseParse { status, .. } => *status,
			_ => None,
		}
	}

	/// Retry-After hint attached to the failure, when known.
	pub fn retry_after(&self) -> Option<Duration> {
		match self {
			Self::Provider { retry_after, .. } => *retry_after,
			_ => None,
		}
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request did not complete before the client's timeout.
	#[error("Request timed out while calling the token endpoint.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
	/// Transport failed without a structured error.
	#[error("HTTP client error occurred while calling the token endpoint: {message}.")]
	Other {
		/// Transport-supplied description.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}
