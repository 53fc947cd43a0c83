// self
use crate::{credential::CredentialKind, obs::AuthOutcome};

/// Records a signing outcome via the global metrics recorder (when enabled).
pub fn record_sign_outcome(kind: CredentialKind, outcome: AuthOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_client_auth_sign_total",
			"kind" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records a throttling decision via the global metrics recorder (when enabled).
pub fn record_throttle_outcome(provider: &'static str, outcome: AuthOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_client_auth_throttle_total",
			"provider" => provider,
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (provider, outcome);
	}
}
