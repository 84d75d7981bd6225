//! `Authorization` header rendering for collaborators that call the Bookings API.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Header scheme placed in front of the access token.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthScheme {
	/// `Authorization: Zoho-oauthtoken <token>`, expected by Zoho REST APIs.
	#[default]
	ZohoOAuthToken,
	/// `Authorization: Bearer <token>`.
	Bearer,
}
impl AuthScheme {
	/// Returns the literal scheme prefix.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthScheme::ZohoOAuthToken => "Zoho-oauthtoken",
			AuthScheme::Bearer => "Bearer",
		}
	}

	/// Renders the full header value for `token`.
	pub fn header_value(self, token: &TokenSecret) -> String {
		format!("{} {}", self.as_str(), token.expose())
	}

	/// Attaches the `Authorization` header to a reqwest request builder.
	#[cfg(feature = "reqwest")]
	pub fn apply(
		self,
		request: reqwest::RequestBuilder,
		token: &TokenSecret,
	) -> reqwest::RequestBuilder {
		request.header(reqwest::header::AUTHORIZATION, self.header_value(token))
	}
}
impl Display for AuthScheme {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
