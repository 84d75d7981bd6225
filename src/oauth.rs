//! `refresh_token` grant exchange against the accounts server.
//!
//! The request is built by hand instead of through `oauth2::BasicClient` because the
//! accounts server omits `token_type` from some responses and reports failures with HTTP 200
//! plus an `error` field, neither of which the standard token response accepts.

pub use oauth2;

// crates.io
use oauth2::{
	AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
	http::{
		Method, StatusCode,
		header::{ACCEPT, CONTENT_TYPE},
	},
};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	config::ClientCredentials,
	error::{ConfigError, RefreshError, TransportError},
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
};

/// `grant_type` value sent with every exchange.
pub const GRANT_TYPE: &str = "refresh_token";

/// Maps HTTP transport failures into cache [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a cache error.
	fn map_transport_error(
		&self,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		_metadata: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) =>
				if inner.is_builder() {
					ConfigError::from(*inner).into()
				} else {
					TransportError::from(*inner).into()
				},
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => TransportError::Other { message }.into(),
			_ => TransportError::Other { message: "unrecognized transport failure".into() }.into(),
		}
	}
}

/// Access token and lifetime returned by a successful exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedToken {
	/// Fresh access token.
	pub access_token: TokenSecret,
	/// Lifetime in seconds, as reported by the provider.
	pub expires_in: u64,
}

#[derive(Deserialize)]
struct TokenEndpointResponse {
	access_token: String,
	#[serde(default)]
	expires_in: Option<u64>,
}

#[derive(Deserialize)]
struct TokenEndpointError {
	error: String,
	#[serde(default)]
	error_description: Option<String>,
}

/// Performs one `refresh_token` exchange through `http_client`.
pub async fn exchange_refresh_token<C, M>(
	http_client: &C,
	mapper: &M,
	endpoint: &Url,
	credentials: ClientCredentials<'_>,
) -> Result<IssuedToken>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let request = build_refresh_request(endpoint, credentials)?;
	let meta = ResponseMetadataSlot::default();
	let handle = http_client.with_metadata(meta.clone());
	let response = handle
		.call(request)
		.await
		.map_err(|err| mapper.map_transport_error(meta.take().as_ref(), err))?;
	let retry_after = meta.take().and_then(|value| value.retry_after);

	Ok(parse_token_response(&response, retry_after)?)
}

/// Builds the form-encoded `POST` sent to the token endpoint.
pub fn build_refresh_request(
	endpoint: &Url,
	credentials: ClientCredentials<'_>,
) -> Result<HttpRequest, ConfigError> {
	let body = url::form_urlencoded::Serializer::new(String::new())
		.append_pair("refresh_token", credentials.refresh_token.expose())
		.append_pair("client_id", credentials.client_id)
		.append_pair("client_secret", credentials.client_secret.expose())
		.append_pair("grant_type", GRANT_TYPE)
		.finish();

	oauth2::http::Request::builder()
		.method(Method::POST)
		.uri(endpoint.as_str())
		.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
		.header(ACCEPT, "application/json")
		.body(body.into_bytes())
		.map_err(ConfigError::from)
}

/// Interprets a token endpoint response.
///
/// An `error` field wins over the status code, so `200 {"error": "invalid_code"}` is a
/// provider rejection rather than a parse failure.
pub fn parse_token_response(
	response: &HttpResponse,
	retry_after: Option<Duration>,
) -> Result<IssuedToken, RefreshError> {
	let status = response.status();
	let body = response.body().as_slice();

	if let Ok(rejection) = serde_json::from_slice::<TokenEndpointError>(body) {
		let message = rejection.error_description.unwrap_or_else(|| rejection.error.clone());

		return Err(RefreshError::Provider {
			status: Some(status.as_u16()),
			code: Some(rejection.error),
			message,
			retry_after,
		});
	}
	if !status.is_success() {
		return Err(RefreshError::Provider {
			status: Some(status.as_u16()),
			code: None,
			message: status_message(status),
			retry_after,
		});
	}

	let de = &mut serde_json::Deserializer::from_slice(body);
	let parsed: TokenEndpointResponse = serde_path_to_error::deserialize(de)
		.map_err(|source| RefreshError::ResponseParse { source, status: Some(status.as_u16()) })?;
	let expires_in = parsed.expires_in.ok_or(RefreshError::MissingExpiresIn)?;

	Ok(IssuedToken { access_token: TokenSecret::new(parsed.access_token), expires_in })
}

fn status_message(status: StatusCode) -> String {
	match status.canonical_reason() {
		Some(reason) => format!("HTTP {} {reason}", status.as_u16()),
		None => format!("HTTP {}", status.as_u16()),
	}
}
