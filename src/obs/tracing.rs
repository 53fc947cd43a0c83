// self
use crate::{
	_prelude::*,
	obs::{AuthOperation, AuthOutcome},
};

/// A span builder used by signing and throttling operations.
#[derive(Clone, Debug)]
pub struct AuthSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl AuthSpan {
	/// Creates a new span tagged with the provided operation + stage.
	pub fn new(op: AuthOperation, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("oauth2_client_auth.op", op = op.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (op, stage);

			Self {}
		}
	}

	/// Enters the span for the rest of the enclosing scope.
	pub fn entered(self) -> AuthSpanGuard {
		#[cfg(feature = "tracing")]
		{
			AuthSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			AuthSpanGuard {}
		}
	}
}

/// RAII guard returned by [`AuthSpan::entered`].
pub struct AuthSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for AuthSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("AuthSpanGuard(..)")
	}
}

/// Emits a throttling event; `Recorded` and `Throttled` log at info, the rest at debug.
pub fn log_throttle_event(provider: &'static str, outcome: AuthOutcome, ttl: Option<Duration>) {
	#[cfg(feature = "tracing")]
	{
		let ttl_secs = ttl.map(|ttl| ttl.whole_seconds());

		match outcome {
			AuthOutcome::Recorded | AuthOutcome::Throttled => tracing::info!(
				provider,
				outcome = outcome.as_str(),
				ttl_secs,
				"[Throttling] request {} by {provider}.",
				outcome.as_str()
			),
			_ => tracing::debug!(provider, outcome = outcome.as_str(), ttl_secs),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (provider, outcome, ttl);
	}
}
