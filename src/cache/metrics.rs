// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing how the cache has been used.
#[derive(Debug, Default)]
pub struct CacheMetrics {
	hits: AtomicU64,
	refresh_attempts: AtomicU64,
	refresh_successes: AtomicU64,
	refresh_failures: AtomicU64,
	config_failures: AtomicU64,
}
impl CacheMetrics {
	/// Number of calls answered from the slot without I/O.
	pub fn hits(&self) -> u64 {
		self.hits.load(Ordering::Relaxed)
	}

	/// Number of token exchanges started; equals the number of network requests issued.
	pub fn refresh_attempts(&self) -> u64 {
		self.refresh_attempts.load(Ordering::Relaxed)
	}

	/// Number of exchanges that produced a new cached credential.
	pub fn refresh_successes(&self) -> u64 {
		self.refresh_successes.load(Ordering::Relaxed)
	}

	/// Number of exchanges that failed.
	pub fn refresh_failures(&self) -> u64 {
		self.refresh_failures.load(Ordering::Relaxed)
	}

	/// Number of calls rejected because a required secret was missing.
	pub fn config_failures(&self) -> u64 {
		self.config_failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_hit(&self) {
		self.hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_attempt(&self) {
		self.refresh_attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_success(&self) {
		self.refresh_successes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_failure(&self) {
		self.refresh_failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_config_failure(&self) {
		self.config_failures.fetch_add(1, Ordering::Relaxed);
	}
}
