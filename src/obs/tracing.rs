// self
use crate::{
	_prelude::*,
	obs::{CacheEvent, CacheOp},
};

/// Instrumented future when tracing is enabled, the bare future otherwise.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Instrumented future when tracing is enabled, the bare future otherwise.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// Span covering one cache operation.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Opens a `zoho_token_cache.op` span for `op` at `stage`.
	pub fn new(op: CacheOp, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			Self { span: tracing::info_span!("zoho_token_cache.op", op = op.as_str(), stage) }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (op, stage);

			Self {}
		}
	}

	/// Runs `fut` inside the span without holding an entered guard across `.await`.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs `event` at a level matching its weight.
pub(super) fn emit(event: &CacheEvent<'_>) {
	#[cfg(feature = "tracing")]
	match event {
		CacheEvent::Hit { expires_at } => {
			tracing::debug!(%expires_at, "served cached access token");
		},
		CacheEvent::RefreshStarted => {
			tracing::debug!("exchanging refresh token");
		},
		CacheEvent::Refreshed { expires_at } => {
			tracing::info!(%expires_at, "refreshed access token");
		},
		CacheEvent::Failed { op, error } => {
			tracing::warn!(
				op = op.as_str(),
				status = error.status(),
				retryable = error.is_retryable(),
				%error,
				"token cache operation failed"
			);
		},
	}
	#[cfg(not(feature = "tracing"))]
	let _ = event;
}
