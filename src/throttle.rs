//! Request throttling: remember recent deterministic failures and fail matching requests fast.
//!
//! The request pipeline asks every registered [`ThrottlingProvider`] to
//! [`try_throttle`](ThrottlingProvider::try_throttle) before calling the token endpoint and
//! reports failures through [`record_exception`](ThrottlingProvider::record_exception)
//! afterwards. [`ThrottlingManager`] fans both calls out across the registered providers.

pub mod cache;
pub mod thumbprint;
pub mod ui_required;

pub use cache::*;
pub use thumbprint::*;
pub use ui_required::*;

// self
use crate::_prelude::*;

/// Classification of token endpoint failures relevant to throttling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceErrorKind {
	/// The request cannot succeed until the user interacts (consent, MFA, re-login).
	UiRequired,
	/// Any other token endpoint failure.
	Service,
}
impl ServiceErrorKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ServiceErrorKind::UiRequired => "ui_required",
			ServiceErrorKind::Service => "service",
		}
	}
}

/// Structured token endpoint failure handed over by the request pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
#[error("Token endpoint returned {code}: {message}.")]
pub struct ServiceError {
	/// Failure classification.
	pub kind: ServiceErrorKind,
	/// OAuth error code (e.g. `invalid_grant`).
	pub code: String,
	/// Human-readable description.
	pub message: String,
	/// HTTP status code, when available.
	pub status: Option<u16>,
}
impl ServiceError {
	/// Creates a failure that requires user interaction.
	pub fn ui_required(code: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			kind: ServiceErrorKind::UiRequired,
			code: code.into(),
			message: message.into(),
			status: None,
		}
	}

	/// Creates a generic service failure.
	pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			kind: ServiceErrorKind::Service,
			code: code.into(),
			message: message.into(),
			status: None,
		}
	}

	/// Attaches the HTTP status code.
	pub fn with_status(mut self, status: u16) -> Self {
		self.status = Some(status);

		self
	}

	/// Returns `true` for [`ServiceErrorKind::UiRequired`] failures.
	pub fn is_ui_required(&self) -> bool {
		self.kind == ServiceErrorKind::UiRequired
	}
}

/// Token request context used to fingerprint requests.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ThrottleRequest {
	/// Canonical authority string.
	pub authority: String,
	/// Home account identifier of the signed-in account, if any.
	pub home_account_id: Option<String>,
	/// Token request body parameters.
	pub body: BTreeMap<String, String>,
}
impl ThrottleRequest {
	/// Creates a request for an already canonical authority string.
	pub fn new(authority: impl Into<String>) -> Self {
		Self { authority: authority.into(), home_account_id: None, body: BTreeMap::new() }
	}

	/// Creates a request for `authority`, canonicalized with a trailing slash.
	pub fn for_authority(authority: &Url) -> Self {
		let mut canonical = authority.clone();

		canonical.set_query(None);
		canonical.set_fragment(None);

		if !canonical.path().ends_with('/') {
			let path = format!("{}/", canonical.path());

			canonical.set_path(&path);
		}

		Self::new(canonical)
	}

	/// Sets the home account identifier.
	pub fn with_home_account_id(mut self, home_account_id: impl Into<String>) -> Self {
		self.home_account_id = Some(home_account_id.into());

		self
	}

	/// Adds or replaces body parameters.
	pub fn with_body<I, K, V>(mut self, body: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.body.extend(body.into_iter().map(|(k, v)| (k.into(), v.into())));

		self
	}

	/// Adds or replaces one body parameter.
	pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.body.insert(key.into(), value.into());

		self
	}
}

/// Throttling capability consulted around every token endpoint call.
pub trait ThrottlingProvider
where
	Self: Send + Sync,
{
	/// Stable provider label for logs and metrics.
	fn name(&self) -> &'static str;

	/// Inspects a failure observed for `request` and remembers it when throttle-worthy.
	fn record_exception(&self, request: &ThrottleRequest, error: &ServiceError);

	/// Fails with the remembered error when `request` should not reach the network.
	fn try_throttle(&self, request: &ThrottleRequest) -> Result<()>;

	/// Forgets every remembered failure.
	fn reset_cache(&self);
}

/// Ordered set of throttling providers sharing one request pipeline.
#[derive(Clone, Default)]
pub struct ThrottlingManager {
	providers: Vec<Arc<dyn ThrottlingProvider>>,
}
impl ThrottlingManager {
	/// Creates a manager with the built-in [`UiRequiredProvider`].
	pub fn new() -> Self {
		Self::default().with_provider(Arc::new(UiRequiredProvider::default()))
	}

	/// Registers another provider; providers are consulted in registration order.
	pub fn with_provider(mut self, provider: Arc<dyn ThrottlingProvider>) -> Self {
		self.providers.push(provider);

		self
	}

	/// Registered providers.
	pub fn providers(&self) -> &[Arc<dyn ThrottlingProvider>] {
		&self.providers
	}

	/// Returns the first veto raised by a registered provider.
	pub fn try_throttle(&self, request: &ThrottleRequest) -> Result<()> {
		self.providers.iter().try_for_each(|provider| provider.try_throttle(request))
	}

	/// Reports a failure to every registered provider.
	pub fn record_exception(&self, request: &ThrottleRequest, error: &ServiceError) {
		for provider in &self.providers {
			provider.record_exception(request, error);
		}
	}

	/// Clears every provider's cache.
	pub fn reset_cache(&self) {
		for provider in &self.providers {
			provider.reset_cache();
		}
	}
}
impl Debug for ThrottlingManager {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_list().entries(self.providers.iter().map(|provider| provider.name())).finish()
	}
}
