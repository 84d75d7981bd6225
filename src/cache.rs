//! The access-token cache.
//!
//! [`TokenCache::get_token`] validates the configured secrets, serves the cached token while
//! `now < expires_at - safety_margin`, and otherwise performs one `refresh_token` exchange
//! and overwrites the slot. Failed exchanges leave the slot untouched. The stale value is
//! kept but never served.
//!
//! Concurrent callers that all miss each perform their own exchange by default and the last
//! successful write wins. [`TokenCache::with_singleflight`] serializes exchanges instead, so
//! waiters reuse the token written by whoever refreshed first.

mod metrics;

pub use metrics::CacheMetrics;

// self
use crate::{
	_prelude::*,
	auth::{CachedCredential, TokenSecret},
	clock::{Clock, SystemClock},
	config::{ClientConfig, ClientCredentials},
	http::TokenHttpClient,
	oauth::{self, TransportErrorMapper},
	obs::{self, CacheEvent, CacheOp, OpSpan},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

/// Cache specialized for the crate's default reqwest transport stack.
#[cfg(feature = "reqwest")]
pub type ReqwestTokenCache = TokenCache<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Single-slot OAuth access-token cache for one client registration.
///
/// Construct one per process and share it behind an [`Arc`].
pub struct TokenCache<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	config: ClientConfig,
	http_client: Arc<C>,
	transport_mapper: Arc<M>,
	clock: Arc<dyn Clock>,
	slot: RwLock<Option<CachedCredential>>,
	singleflight: Option<AsyncMutex<()>>,
	metrics: CacheMetrics,
}
impl<C, M> TokenCache<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a cache that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		config: ClientConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			config,
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			clock: Arc::new(SystemClock),
			slot: RwLock::new(None),
			singleflight: None,
			metrics: CacheMetrics::default(),
		}
	}

	/// Replaces the time source.
	pub fn with_clock(mut self, clock: impl 'static + Clock) -> Self {
		self.clock = Arc::new(clock);

		self
	}

	/// Serializes concurrent refreshes behind one in-flight exchange when `enabled`.
	pub fn with_singleflight(mut self, enabled: bool) -> Self {
		self.singleflight = enabled.then(|| AsyncMutex::new(()));

		self
	}

	/// Returns a valid access token, refreshing it first when the cached one is missing or
	/// inside the safety margin.
	///
	/// Fails with [`Error::Config`] before any I/O when a required secret is missing, and
	/// with [`Error::Refresh`] when the exchange fails. Never retries internally.
	pub async fn get_token(&self) -> Result<TokenSecret> {
		const OP: CacheOp = CacheOp::GetToken;

		let span = OpSpan::new(OP, "get_token");

		span.instrument(async move {
			let credentials = match self.config.credentials() {
				Ok(credentials) => credentials,
				Err(e) => {
					let err = Error::from(e);

					self.metrics.record_config_failure();
					obs::record(CacheEvent::Failed { op: OP, error: &err });

					return Err(err);
				},
			};

			if let Some(token) = self.serve_cached() {
				return Ok(token);
			}

			match &self.singleflight {
				Some(guard) => {
					let _singleflight = guard.lock().await;

					// Whoever held the guard may have refreshed already.
					if let Some(token) = self.serve_cached() {
						return Ok(token);
					}

					self.refresh(credentials).await
				},
				None => self.refresh(credentials).await,
			}
		})
		.await
	}

	/// Returns `"<scheme> <token>"` for the configured [`AuthScheme`](crate::signer::AuthScheme).
	pub async fn authorization_header(&self) -> Result<String> {
		let token = self.get_token().await?;

		Ok(self.config.auth_scheme.header_value(&token))
	}

	/// Attaches an `Authorization` header carrying a valid token to `request`.
	#[cfg(feature = "reqwest")]
	pub async fn authorize(
		&self,
		request: reqwest::RequestBuilder,
	) -> Result<reqwest::RequestBuilder> {
		let token = self.get_token().await?;

		Ok(self.config.auth_scheme.apply(request, &token))
	}

	/// Snapshot of the cached credential, whether or not it is still fresh.
	pub fn cached(&self) -> Option<CachedCredential> {
		self.slot.read().clone()
	}

	/// Usage counters.
	pub fn metrics(&self) -> &CacheMetrics {
		&self.metrics
	}

	/// Configuration the cache was built with.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Workspace identifier for downstream Bookings calls.
	pub fn workspace_id(&self) -> Option<&str> {
		self.config.workspace_id.as_deref()
	}

	fn serve_cached(&self) -> Option<TokenSecret> {
		let now = self.clock.now();
		let slot = self.slot.read();
		let credential = slot
			.as_ref()
			.filter(|credential| credential.is_fresh_at(now, self.config.safety_margin))?;

		self.metrics.record_hit();
		obs::record(CacheEvent::Hit { expires_at: credential.expires_at });

		Some(credential.token.clone())
	}

	async fn refresh(&self, credentials: ClientCredentials<'_>) -> Result<TokenSecret> {
		const OP: CacheOp = CacheOp::Refresh;

		let span = OpSpan::new(OP, "refresh");

		self.metrics.record_refresh_attempt();
		obs::record(CacheEvent::RefreshStarted);

		let result = span
			.instrument(async move {
				let issued = oauth::exchange_refresh_token(
					self.http_client.as_ref(),
					self.transport_mapper.as_ref(),
					&self.config.token_endpoint,
					credentials,
				)
				.await?;
				let issued_at = self.clock.now();
				let credential =
					CachedCredential::issue(issued.access_token, issued_at, issued.expires_in)?;
				let token = credential.token.clone();
				let expires_at = credential.expires_at;

				*self.slot.write() = Some(credential);

				obs::record(CacheEvent::Refreshed { expires_at });

				Ok::<_, Error>(token)
			})
			.await;

		match &result {
			Ok(_) => self.metrics.record_refresh_success(),
			Err(err) => {
				self.metrics.record_refresh_failure();
				obs::record(CacheEvent::Failed { op: OP, error: err });
			},
		}

		result
	}
}
#[cfg(feature = "reqwest")]
impl TokenCache<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a cache backed by a redirect-free reqwest client and the system clock.
	pub fn new(config: ClientConfig) -> Result<Self> {
		Ok(Self::with_http_client(
			config,
			ReqwestHttpClient::without_redirects()?,
			ReqwestTransportErrorMapper,
		))
	}
}
impl<C, M> Debug for TokenCache<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenCache")
			.field("config", &self.config)
			.field("cached", &*self.slot.read())
			.field("singleflight", &self.singleflight.is_some())
			.finish()
	}
}
