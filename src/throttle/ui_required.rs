//! Throttling for failures that need user interaction.
//!
//! A UI-required failure reproduces identically until the user acts (consent, MFA, sign-in), so
//! replaying the same request before [`UI_REQUIRED_EXPIRATION`] elapses only adds latency. The
//! provider remembers those failures by full request thumbprint and re-delivers them without a
//! network round trip.

// self
use crate::{
	_prelude::*,
	obs::{self, AuthOperation, AuthOutcome, AuthSpan},
	throttle::{
		DefaultThumbprintStrategy, ServiceError, ThrottleRequest, ThrottlingCache,
		ThrottlingCacheEntry, ThrottlingProvider, ThumbprintStrategy, request_full_thumbprint,
	},
};

/// How long a UI-required failure keeps throttling identical requests.
pub const UI_REQUIRED_EXPIRATION: Duration = Duration::seconds(120);

const PROVIDER_NAME: &str = "ui_required";

/// [`ThrottlingProvider`] that replays recent UI-required failures.
pub struct UiRequiredProvider {
	cache: ThrottlingCache,
	strategy: Arc<dyn ThumbprintStrategy>,
}
impl UiRequiredProvider {
	/// Creates a provider that fingerprints requests with `strategy`.
	pub fn with_strategy(strategy: Arc<dyn ThumbprintStrategy>) -> Self {
		Self { cache: ThrottlingCache::default(), strategy }
	}

	/// Backing cache.
	pub fn cache(&self) -> &ThrottlingCache {
		&self.cache
	}

	/// Full thumbprint of `request`.
	pub fn thumbprint(&self, request: &ThrottleRequest) -> String {
		request_full_thumbprint(self.strategy.as_ref(), request)
	}

	/// Records `error` for `request` as of `now` when it is a UI-required failure.
	pub fn record_exception_at(
		&self,
		request: &ThrottleRequest,
		error: &ServiceError,
		now: OffsetDateTime,
	) {
		let _span = AuthSpan::new(AuthOperation::RecordException, PROVIDER_NAME).entered();

		if !error.is_ui_required() {
			obs::record_throttle_outcome(PROVIDER_NAME, AuthOutcome::Ignored);

			return;
		}

		let entry = ThrottlingCacheEntry::new_at(error.clone(), now, UI_REQUIRED_EXPIRATION);

		self.cache.add_and_cleanup_at(self.thumbprint(request), entry, now);

		obs::log_throttle_event(PROVIDER_NAME, AuthOutcome::Recorded, Some(UI_REQUIRED_EXPIRATION));
		obs::record_throttle_outcome(PROVIDER_NAME, AuthOutcome::Recorded);
	}

	/// Fails with the recorded error if `request` matches a failure still live at `now`.
	pub fn try_throttle_at(&self, request: &ThrottleRequest, now: OffsetDateTime) -> Result<()> {
		if self.cache.is_empty() {
			return Ok(());
		}

		let _span = AuthSpan::new(AuthOperation::TryThrottle, PROVIDER_NAME).entered();

		match self.cache.lookup_live_at(&self.thumbprint(request), now) {
			Some(entry) => {
				obs::log_throttle_event(PROVIDER_NAME, AuthOutcome::Throttled, None);
				obs::record_throttle_outcome(PROVIDER_NAME, AuthOutcome::Throttled);

				Err(Error::Service(entry.error))
			},
			None => {
				obs::record_throttle_outcome(PROVIDER_NAME, AuthOutcome::Passed);

				Ok(())
			},
		}
	}
}
impl Default for UiRequiredProvider {
	fn default() -> Self {
		Self::with_strategy(Arc::new(DefaultThumbprintStrategy))
	}
}
impl ThrottlingProvider for UiRequiredProvider {
	fn name(&self) -> &'static str {
		PROVIDER_NAME
	}

	fn record_exception(&self, request: &ThrottleRequest, error: &ServiceError) {
		self.record_exception_at(request, error, OffsetDateTime::now_utc());
	}

	fn try_throttle(&self, request: &ThrottleRequest) -> Result<()> {
		self.try_throttle_at(request, OffsetDateTime::now_utc())
	}

	fn reset_cache(&self) {
		self.cache.clear();
	}
}
impl Debug for UiRequiredProvider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("UiRequiredProvider").field("cache", &self.cache).finish()
	}
}
