//! Optional observability helpers for signing and throttling.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oauth2_client_auth.op` with the `op`
//!   (operation) and `stage` (call site) fields, plus events for throttling decisions.
//! - Enable `metrics` to increment `oauth2_client_auth_sign_total` (labeled by `kind` +
//!   `outcome`) and `oauth2_client_auth_throttle_total` (labeled by `provider` + `outcome`).

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthOperation {
	/// Credential configuration validation.
	Validate,
	/// Client assertion signing.
	Sign,
	/// Recording a token endpoint failure for throttling.
	RecordException,
	/// Checking whether a request should be throttled.
	TryThrottle,
}
impl AuthOperation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthOperation::Validate => "validate",
			AuthOperation::Sign => "sign",
			AuthOperation::RecordException => "record_exception",
			AuthOperation::TryThrottle => "try_throttle",
		}
	}
}
impl Display for AuthOperation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// A failure was stored in a throttling cache.
	Recorded,
	/// A failure was not eligible for throttling.
	Ignored,
	/// A request was vetoed with a cached failure.
	Throttled,
	/// A request was allowed through.
	Passed,
}
impl AuthOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthOutcome::Attempt => "attempt",
			AuthOutcome::Success => "success",
			AuthOutcome::Failure => "failure",
			AuthOutcome::Recorded => "recorded",
			AuthOutcome::Ignored => "ignored",
			AuthOutcome::Throttled => "throttled",
			AuthOutcome::Passed => "passed",
		}
	}
}
impl Display for AuthOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
