//! Client configuration: the secrets supplied at process start plus cache tunables.
//!
//! Missing secrets are not load errors. They are recorded as absent and
//! reported by [`ClientConfig::credentials`], which the cache calls on every
//! [`get_token`](crate::cache::TokenCache::get_token) so a misconfigured process fails closed
//! without touching the network. Malformed values (unparsable URLs, negative margins) are
//! rejected while loading.

// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError, signer::AuthScheme};

/// Environment variable carrying the OAuth client identifier.
pub const ENV_CLIENT_ID: &str = "ZOHO_CLIENT_ID";
/// Environment variable carrying the OAuth client secret.
pub const ENV_CLIENT_SECRET: &str = "ZOHO_CLIENT_SECRET";
/// Environment variable carrying the long-lived refresh token.
pub const ENV_REFRESH_TOKEN: &str = "ZOHO_REFRESH_TOKEN";
/// Environment variable carrying the Bookings workspace identifier.
pub const ENV_WORKSPACE_ID: &str = "ZOHO_WORKSPACE_ID";
/// Environment variable selecting the data-center specific accounts server.
pub const ENV_ACCOUNTS_URL: &str = "ZOHO_ACCOUNTS_URL";
/// Environment variable overriding the full token endpoint.
pub const ENV_TOKEN_ENDPOINT: &str = "ZOHO_TOKEN_ENDPOINT";
/// Environment variable overriding the safety margin, in seconds.
pub const ENV_SAFETY_MARGIN_SECS: &str = "ZOHO_TOKEN_SAFETY_MARGIN_SECS";

/// Accounts server used when none is configured.
pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.zoho.com";
/// Path of the token endpoint on the accounts server.
pub const TOKEN_PATH: &str = "/oauth/v2/token";
/// Buffer subtracted from the reported expiry before a token stops being served.
pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::seconds(60);

/// Validated view of the three required secrets.
#[derive(Clone, Copy)]
pub struct ClientCredentials<'a> {
	/// OAuth client identifier.
	pub client_id: &'a str,
	/// OAuth client secret.
	pub client_secret: &'a TokenSecret,
	/// Long-lived refresh token exchanged for access tokens.
	pub refresh_token: &'a TokenSecret,
}
impl Debug for ClientCredentials<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientCredentials")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.finish()
	}
}

/// Secrets and tunables consumed by [`TokenCache`](crate::cache::TokenCache).
#[derive(Clone, Deserialize)]
pub struct ClientConfig {
	/// OAuth client identifier.
	#[serde(default)]
	pub client_id: Option<String>,
	/// OAuth client secret.
	#[serde(default)]
	pub client_secret: Option<TokenSecret>,
	/// Long-lived refresh token.
	#[serde(default)]
	pub refresh_token: Option<TokenSecret>,
	/// Workspace identifier for downstream Bookings calls; the cache never reads it.
	#[serde(default)]
	pub workspace_id: Option<String>,
	/// Token endpoint receiving the `refresh_token` grant.
	#[serde(deserialize_with = "deserialize_endpoint")]
	pub token_endpoint: Url,
	/// Buffer subtracted from the reported expiry.
	#[serde(default = "default_safety_margin", deserialize_with = "deserialize_safety_margin")]
	pub safety_margin: Duration,
	/// Header scheme used when collaborators ask for an `Authorization` value.
	#[serde(default)]
	pub auth_scheme: AuthScheme,
}
impl ClientConfig {
	/// Creates an empty configuration targeting `token_endpoint`.
	pub fn new(token_endpoint: Url) -> Result<Self, ConfigError> {
		validate_endpoint(&token_endpoint)?;

		Ok(Self {
			client_id: None,
			client_secret: None,
			refresh_token: None,
			workspace_id: None,
			token_endpoint,
			safety_margin: DEFAULT_SAFETY_MARGIN,
			auth_scheme: AuthScheme::default(),
		})
	}

	/// Loads configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Loads configuration through `lookup`, which maps a variable name to its value.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let read = |name: &str| lookup(name).map(|value| value.trim().to_owned());
		let token_endpoint = match read(ENV_TOKEN_ENDPOINT).filter(|value| !value.is_empty()) {
			Some(raw) => parse_endpoint(&raw)?,
			None => {
				let accounts = read(ENV_ACCOUNTS_URL)
					.filter(|value| !value.is_empty())
					.unwrap_or_else(|| DEFAULT_ACCOUNTS_URL.to_owned());

				parse_endpoint(&format!("{}{TOKEN_PATH}", accounts.trim_end_matches('/')))?
			},
		};
		let mut config = Self::new(token_endpoint)?;

		config.client_id = read(ENV_CLIENT_ID);
		config.client_secret = read(ENV_CLIENT_SECRET).map(TokenSecret::new);
		config.refresh_token = read(ENV_REFRESH_TOKEN).map(TokenSecret::new);
		config.workspace_id = read(ENV_WORKSPACE_ID).filter(|value| !value.is_empty());

		if let Some(raw) = read(ENV_SAFETY_MARGIN_SECS).filter(|value| !value.is_empty()) {
			config.safety_margin = parse_safety_margin(&raw)?;
		}

		Ok(config)
	}

	/// Sets the OAuth client identifier.
	pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = Some(client_id.into());

		self
	}

	/// Sets the OAuth client secret.
	pub fn with_client_secret(mut self, secret: impl Into<TokenSecret>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}

	/// Sets the long-lived refresh token.
	pub fn with_refresh_token(mut self, token: impl Into<TokenSecret>) -> Self {
		self.refresh_token = Some(token.into());

		self
	}

	/// Sets the workspace identifier exposed to collaborators.
	pub fn with_workspace_id(mut self, workspace_id: impl Into<String>) -> Self {
		self.workspace_id = Some(workspace_id.into());

		self
	}

	/// Overrides the safety margin; negative values clamp to zero.
	pub fn with_safety_margin(mut self, margin: Duration) -> Self {
		self.safety_margin = if margin.is_negative() { Duration::ZERO } else { margin };

		self
	}

	/// Overrides the `Authorization` header scheme.
	pub fn with_auth_scheme(mut self, scheme: AuthScheme) -> Self {
		self.auth_scheme = scheme;

		self
	}

	/// Returns the three required secrets, or the name of the first one that is missing.
	pub fn credentials(&self) -> Result<ClientCredentials<'_>, ConfigError> {
		let client_id = self
			.client_id
			.as_deref()
			.filter(|value| !value.trim().is_empty())
			.ok_or(ConfigError::MissingSecret { name: ENV_CLIENT_ID })?;
		let client_secret = self
			.client_secret
			.as_ref()
			.filter(|secret| !secret.is_blank())
			.ok_or(ConfigError::MissingSecret { name: ENV_CLIENT_SECRET })?;
		let refresh_token = self
			.refresh_token
			.as_ref()
			.filter(|secret| !secret.is_blank())
			.ok_or(ConfigError::MissingSecret { name: ENV_REFRESH_TOKEN })?;

		Ok(ClientCredentials { client_id, client_secret, refresh_token })
	}
}
impl Debug for ClientConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientConfig")
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("refresh_token_set", &self.refresh_token.is_some())
			.field("workspace_id", &self.workspace_id)
			.field("token_endpoint", &self.token_endpoint.as_str())
			.field("safety_margin", &self.safety_margin)
			.field("auth_scheme", &self.auth_scheme)
			.finish()
	}
}

fn default_safety_margin() -> Duration {
	DEFAULT_SAFETY_MARGIN
}

fn deserialize_endpoint<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
	D: serde::Deserializer<'de>,
{
	let url = Url::deserialize(deserializer)?;

	validate_endpoint(&url).map_err(serde::de::Error::custom)?;

	Ok(url)
}

fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw)
		.map_err(|source| ConfigError::InvalidTokenEndpoint { value: raw.to_owned(), source })
}

fn parse_safety_margin(raw: &str) -> Result<Duration, ConfigError> {
	let secs = raw
		.parse::<u32>()
		.map_err(|_| ConfigError::InvalidSafetyMargin { value: raw.to_owned() })?;

	Ok(Duration::seconds(i64::from(secs)))
}

/// Plain HTTP is accepted only for loopback hosts (local development and tests).
fn validate_endpoint(url: &Url) -> Result<(), ConfigError> {
	let loopback = match url.host() {
		Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(url::Host::Ipv4(addr)) => addr.is_loopback(),
		Some(url::Host::Ipv6(addr)) => addr.is_loopback(),
		None => false,
	};

	match url.scheme() {
		"https" => Ok(()),
		"http" if loopback => Ok(()),
		_ => Err(ConfigError::InsecureTokenEndpoint { url: url.to_string() }),
	}
}

fn deserialize_safety_margin<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
	D: serde::Deserializer<'de>,
{
	let secs = u32::deserialize(deserializer)?;

	Ok(Duration::seconds(i64::from(secs)))
}
