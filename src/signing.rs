//! Pluggable signing backends.
//!
//! A [`SecurityKey`] describes key material (an in-process RSA key, an HSM slot, a remote key
//! service handle). A [`SignatureProviderFactory`] turns a key plus a [`SigningAlgorithm`] into a
//! short-lived [`SignatureProvider`], which must be handed back through
//! [`SignatureProviderFactory::release`] once signing completes. [`ProviderLease`] owns that
//! acquire/release pairing so every exit path, including errors, returns the provider.

pub mod rsa_key;

pub use rsa_key::*;

// std
use std::{any::Any, mem::ManuallyDrop};
// self
use crate::{_prelude::*, error::SigningError};

/// Algorithms understood by signature provider factories.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SigningAlgorithm {
	/// RSASSA-PKCS1-v1_5 using SHA-256.
	#[default]
	Rs256,
	/// RSASSA-PKCS1-v1_5 using SHA-384.
	Rs384,
	/// RSASSA-PKCS1-v1_5 using SHA-512.
	Rs512,
	/// Backend-specific algorithm label passed through verbatim.
	Other(String),
}
impl SigningAlgorithm {
	/// Returns the JOSE `alg` label.
	pub fn as_str(&self) -> &str {
		match self {
			Self::Rs256 => "RS256",
			Self::Rs384 => "RS384",
			Self::Rs512 => "RS512",
			Self::Other(label) => label,
		}
	}
}
impl Display for SigningAlgorithm {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl From<String> for SigningAlgorithm {
	fn from(value: String) -> Self {
		match value.as_str() {
			"RS256" => Self::Rs256,
			"RS384" => Self::Rs384,
			"RS512" => Self::Rs512,
			_ => Self::Other(value),
		}
	}
}
impl From<SigningAlgorithm> for String {
	fn from(value: SigningAlgorithm) -> Self {
		match value {
			SigningAlgorithm::Other(label) => label,
			known => known.as_str().to_owned(),
		}
	}
}
impl FromStr for SigningAlgorithm {
	type Err = std::convert::Infallible;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(s.to_owned().into())
	}
}

/// Key material usable by a [`SignatureProviderFactory`].
pub trait SecurityKey
where
	Self: 'static + Send + Sync + Debug,
{
	/// Stable identifier of the key.
	fn key_id(&self) -> &str;

	/// Short key type label used in diagnostics (e.g. `RSA`).
	fn key_type(&self) -> &'static str;

	/// Key size in bits, or `0` when the backend cannot report it.
	fn key_size_bits(&self) -> usize;

	/// Factory bundled with the key, consulted when the credentials carry none.
	fn provider_factory(&self) -> Option<Arc<dyn SignatureProviderFactory>> {
		None
	}

	/// Exposes the concrete key so factories can downcast to the types they support.
	fn as_any(&self) -> &dyn Any;
}

/// Short-lived signer produced by a [`SignatureProviderFactory`].
pub trait SignatureProvider
where
	Self: Send + Sync,
{
	/// Algorithm this provider signs with.
	fn algorithm(&self) -> &SigningAlgorithm;

	/// Signs `payload`, returning the raw signature bytes.
	fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, SigningError>;
}

/// Creates and reclaims [`SignatureProvider`] instances for a key/algorithm pair.
pub trait SignatureProviderFactory
where
	Self: Send + Sync,
{
	/// Returns a provider able to sign with `key` using `algorithm`, or `None` when the pair is
	/// unsupported.
	fn create_for_signing(
		&self,
		key: &dyn SecurityKey,
		algorithm: &SigningAlgorithm,
	) -> Option<Box<dyn SignatureProvider>>;

	/// Reclaims a provider previously returned by
	/// [`create_for_signing`](Self::create_for_signing).
	fn release(&self, provider: Box<dyn SignatureProvider>);
}

/// Key reference, algorithm, and optional provider factory used to sign client assertions.
#[derive(Clone)]
pub struct SigningCredentials {
	/// Key material.
	pub key: Arc<dyn SecurityKey>,
	/// Algorithm requested from the provider factory.
	pub algorithm: SigningAlgorithm,
	/// Explicit factory; falls back to [`SecurityKey::provider_factory`] when unset.
	pub provider_factory: Option<Arc<dyn SignatureProviderFactory>>,
}
impl SigningCredentials {
	/// Creates credentials that rely on the key's bundled provider factory.
	pub fn new(key: Arc<dyn SecurityKey>, algorithm: SigningAlgorithm) -> Self {
		Self { key, algorithm, provider_factory: None }
	}

	/// Overrides the provider factory.
	pub fn with_provider_factory(mut self, factory: Arc<dyn SignatureProviderFactory>) -> Self {
		self.provider_factory = Some(factory);

		self
	}

	/// Resolves the factory to sign with: the explicit one first, then the key's own.
	pub fn resolve_factory(&self) -> Option<Arc<dyn SignatureProviderFactory>> {
		self.provider_factory.clone().or_else(|| self.key.provider_factory())
	}

	/// Signs `message` through a scoped provider lease.
	pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
		let factory = self.resolve_factory().ok_or_else(|| self.unavailable())?;
		let lease = ProviderLease::acquire(factory.as_ref(), self.key.as_ref(), &self.algorithm)?;

		lease.sign(message)
	}

	fn unavailable(&self) -> Error {
		signing_unavailable(self.key.as_ref(), &self.algorithm)
	}
}
impl Debug for SigningCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SigningCredentials")
			.field("key", &self.key)
			.field("algorithm", &self.algorithm)
			.field("provider_factory_set", &self.provider_factory.is_some())
			.finish()
	}
}

/// Scoped ownership of a [`SignatureProvider`]; dropping the lease releases the provider back to
/// its factory.
pub struct ProviderLease<'a> {
	factory: &'a dyn SignatureProviderFactory,
	provider: ManuallyDrop<Box<dyn SignatureProvider>>,
}
impl<'a> ProviderLease<'a> {
	/// Acquires a provider for `key` + `algorithm`, failing with [`Error::SigningUnavailable`]
	/// when the factory has none.
	pub fn acquire(
		factory: &'a dyn SignatureProviderFactory,
		key: &dyn SecurityKey,
		algorithm: &SigningAlgorithm,
	) -> Result<Self> {
		let provider = factory
			.create_for_signing(key, algorithm)
			.ok_or_else(|| signing_unavailable(key, algorithm))?;

		Ok(Self { factory, provider: ManuallyDrop::new(provider) })
	}

	/// Signs `payload` with the leased provider.
	pub fn sign(&self, payload: &[u8]) -> Result<Vec<u8>> {
		self.provider.sign(payload).map_err(Error::from)
	}
}
impl Drop for ProviderLease<'_> {
	fn drop(&mut self) {
		// SAFETY: `provider` is taken exactly once, here, and never touched afterwards.
		let provider = unsafe { ManuallyDrop::take(&mut self.provider) };

		self.factory.release(provider);
	}
}
impl Debug for ProviderLease<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ProviderLease(..)")
	}
}

fn signing_unavailable(key: &dyn SecurityKey, algorithm: &SigningAlgorithm) -> Error {
	let key_id = Some(key.key_id()).filter(|id| !id.is_empty()).map(ToOwned::to_owned);

	Error::SigningUnavailable { key_id, key_type: key.key_type(), algorithm: algorithm.to_string() }
}
