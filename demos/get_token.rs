//! Demonstrates fetching and reusing a Zoho access token through the default reqwest
//! transport, against a mocked accounts server.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use zoho_token_cache::{
	ClientConfig, ReqwestTokenCache, config::TOKEN_PATH, http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper, reqwest::{Client, redirect::Policy},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"1000.demo-access\",\"expires_in\":3600,\"api_domain\":\"https://www.zohoapis.com\"}",
			);
		})
		.await;
	let config = ClientConfig::new(Url::parse(&server.url(TOKEN_PATH))?)?
		.with_client_id("1000.DEMO")
		.with_client_secret("demo-secret")
		.with_refresh_token("1000.demo-refresh")
		.with_workspace_id("4000000000001");
	// The mock server presents a self-signed certificate.
	let http_client = ReqwestHttpClient::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.redirect(Policy::none())
			.build()?,
	);
	let cache =
		ReqwestTokenCache::with_http_client(config, http_client, ReqwestTransportErrorMapper);
	let header = cache.authorization_header().await?;
	let again = cache.get_token().await?;

	println!("Authorization header: {header}.");
	println!("Reused token without a second exchange: {}.", again.expose());
	println!("Cache state: {cache:?}.");

	token_mock.assert_calls_async(1).await;

	Ok(())
}
