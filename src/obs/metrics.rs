// self
use crate::obs::CacheEvent;

/// Increments the event counter through the global metrics recorder.
pub(super) fn count(event: &CacheEvent<'_>) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"zoho_token_cache_events_total",
			"op" => event.op().as_str(),
			"outcome" => event.outcome()
		)
		.increment(1);
	}
	#[cfg(not(feature = "metrics"))]
	let _ = event;
}
