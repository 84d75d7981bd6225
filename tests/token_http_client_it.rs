// std
use std::{
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	future::Future,
	pin::Pin,
	sync::{
		Arc,
		atomic::{AtomicU64, Ordering},
	},
};
// crates.io
use parking_lot::Mutex;
use time::{Duration, OffsetDateTime, macros};
use url::Url;
// self
use zoho_token_cache::{
	ClientConfig, Error, TokenCache,
	clock::ManualClock,
	error::{ConfigError, RefreshError, TransportError},
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	oauth::{
		TransportErrorMapper,
		oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse},
	},
};

const START: OffsetDateTime = macros::datetime!(2025-03-01 09:00 UTC);

#[derive(Debug)]
enum FakeTransportError {
	Throttled,
}
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Throttled => write!(f, "Transport throttled."),
		}
	}
}
impl StdError for FakeTransportError {}

#[derive(Clone, Copy)]
enum Behavior {
	Throttle { retry_after: Duration },
	// Issues `tok_<n>` with a lifetime of `n * 1000` seconds, yielding once before answering.
	Numbered,
}

#[derive(Clone)]
struct FakeHttpClient {
	behavior: Behavior,
	calls: Arc<AtomicU64>,
}
impl FakeHttpClient {
	fn throttled(retry_after: Duration) -> Self {
		Self { behavior: Behavior::Throttle { retry_after }, calls: Arc::default() }
	}

	fn numbered() -> Self {
		Self { behavior: Behavior::Numbered, calls: Arc::default() }
	}

	fn calls(&self) -> u64 {
		self.calls.load(Ordering::SeqCst)
	}
}
impl TokenHttpClient for FakeHttpClient {
	type Handle = FakeHttpHandle;
	type TransportError = FakeTransportError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		FakeHttpHandle { slot, client: self.clone() }
	}
}

struct FakeHttpHandle {
	slot: ResponseMetadataSlot,
	client: FakeHttpClient,
}
impl<'a> AsyncHttpClient<'a> for FakeHttpHandle {
	type Error = HttpClientError<FakeTransportError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'a + Send + Sync>>;

	fn call(&'a self, _request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			assert!(
				self.slot.take().is_none(),
				"ResponseMetadataSlot must be clear before dispatching a request."
			);

			let n = self.client.calls.fetch_add(1, Ordering::SeqCst) + 1;

			match self.client.behavior {
				Behavior::Throttle { retry_after } => {
					let meta =
						ResponseMetadata { status: Some(429), retry_after: Some(retry_after) };

					self.slot.store(meta);

					Err(HttpClientError::Reqwest(Box::new(FakeTransportError::Throttled)))
				},
				Behavior::Numbered => {
					tokio::task::yield_now().await;

					self.slot.store(ResponseMetadata { status: Some(200), retry_after: None });

					let body = format!(r#"{{"access_token":"tok_{n}","expires_in":{}}}"#, n * 1000);

					Ok(HttpResponse::new(body.into_bytes()))
				},
			}
		})
	}
}

#[derive(Clone, Default)]
struct RecordingTransportErrorMapper {
	metadata: Arc<Mutex<Vec<Option<ResponseMetadata>>>>,
}
impl RecordingTransportErrorMapper {
	fn recorded_metadata(&self) -> Vec<Option<ResponseMetadata>> {
		self.metadata.lock().clone()
	}
}
impl TransportErrorMapper<FakeTransportError> for RecordingTransportErrorMapper {
	fn map_transport_error(
		&self,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<FakeTransportError>,
	) -> Error {
		let status = meta.and_then(|value| value.status);
		let retry_after = meta.and_then(|value| value.retry_after);

		self.metadata.lock().push(meta.cloned());

		match err {
			HttpClientError::Reqwest(inner) => RefreshError::Provider {
				status,
				code: None,
				message: format!("Fake transport error: {inner}"),
				retry_after,
			}
			.into(),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => TransportError::Other { message }.into(),
			other => TransportError::Other {
				message: format!("Unhandled HTTP client error variant: {other:?}"),
			}
			.into(),
		}
	}
}

type FakeCache = TokenCache<FakeHttpClient, RecordingTransportErrorMapper>;

fn build_cache(
	http_client: FakeHttpClient,
	mapper: RecordingTransportErrorMapper,
) -> (FakeCache, ManualClock) {
	let config = ClientConfig::new(
		Url::parse("https://accounts.zoho.eu/oauth/v2/token")
			.expect("Failed to parse fake token endpoint URL."),
	)
	.expect("Fake token endpoint should be accepted.")
	.with_client_id("1000.FAKE")
	.with_client_secret("fake-secret")
	.with_refresh_token("1000.fake-refresh");
	let clock = ManualClock::new(START);
	let cache: FakeCache =
		TokenCache::with_http_client(config, http_client, mapper).with_clock(clock.clone());

	(cache, clock)
}

#[tokio::test]
async fn fake_token_http_client_surfaces_metadata() {
	let http_client = FakeHttpClient::throttled(Duration::seconds(5));
	let (cache, _clock) =
		build_cache(http_client.clone(), RecordingTransportErrorMapper::default());
	let err = cache.get_token().await.expect_err("Request should be throttled with HTTP 429.");

	match err {
		Error::Refresh(RefreshError::Provider { status, retry_after, .. }) => {
			assert_eq!(status, Some(429));
			assert_eq!(retry_after, Some(Duration::seconds(5)));
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	assert_eq!(http_client.calls(), 1);
}

#[tokio::test]
async fn fake_mapper_captures_response_metadata() {
	let mapper = RecordingTransportErrorMapper::default();
	let (cache, _clock) =
		build_cache(FakeHttpClient::throttled(Duration::seconds(30)), mapper.clone());
	let _ = cache.get_token().await.expect_err("Request should be throttled with HTTP 429.");
	let observed = mapper.recorded_metadata();

	assert_eq!(observed.len(), 1, "Mapper must record a single request.");

	let meta = observed
		.first()
		.and_then(|value| value.clone())
		.expect("Response metadata should be recorded exactly once.");

	assert_eq!(meta.status, Some(429));
	assert_eq!(meta.retry_after, Some(Duration::seconds(30)));
}

#[tokio::test]
async fn concurrent_misses_leave_a_consistent_slot() {
	let http_client = FakeHttpClient::numbered();
	let (cache, _clock) =
		build_cache(http_client.clone(), RecordingTransportErrorMapper::default());
	let (left, right) = tokio::join!(cache.get_token(), cache.get_token());
	let left = left.expect("First concurrent call should succeed.");
	let right = right.expect("Second concurrent call should succeed.");

	assert_eq!(http_client.calls(), 2, "Without singleflight both misses must exchange.");
	assert_ne!(left, right);

	let cached = cache.cached().expect("Cache slot should be populated.");
	let lifetime = match cached.token.expose() {
		"tok_1" => Duration::seconds(1000),
		"tok_2" => Duration::seconds(2000),
		other => panic!("Unexpected cached token: {other}."),
	};

	assert_eq!(cached.expires_at, START + lifetime, "Token and expiry must share one exchange.");
	assert!(cached.token == left || cached.token == right);
}

#[tokio::test]
async fn singleflight_collapses_concurrent_misses() {
	let http_client = FakeHttpClient::numbered();
	let (cache, _clock) =
		build_cache(http_client.clone(), RecordingTransportErrorMapper::default());
	let cache = cache.with_singleflight(true);
	let (left, right) = tokio::join!(cache.get_token(), cache.get_token());

	assert_eq!(http_client.calls(), 1);
	assert_eq!(left.expect("Leader should refresh.").expose(), "tok_1");
	assert_eq!(right.expect("Follower should reuse the token.").expose(), "tok_1");
}
