//! Crate-level error types shared by credentials, signing backends, and throttling providers.

// self
use crate::{_prelude::*, credential::CredentialKind, throttle::ServiceError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem, surfaced when the client is constructed.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Signing backend failed while producing a signature.
	#[error(transparent)]
	Signing(#[from] SigningError),
	/// Previously observed (or freshly received) token endpoint failure.
	///
	/// Throttling providers re-deliver the recorded error through this variant unchanged, so
	/// callers handle a throttled failure exactly like the original one.
	#[error(transparent)]
	Service(#[from] ServiceError),

	/// The configured key/algorithm pair has no signature provider.
	#[error(
		"Signing credentials cannot be used to sign: no `{algorithm}` provider for key type \
		 `{key_type}` (kid: {key_id:?})."
	)]
	SigningUnavailable {
		/// Key identifier reported by the key, when it has one.
		key_id: Option<String>,
		/// Key type label reported by the key.
		key_type: &'static str,
		/// Algorithm label requested from the provider factory.
		algorithm: String,
	},
	/// The operation does not apply to the configured credential kind.
	#[error("The {operation} operation is not supported for {kind} credentials.")]
	NotSupported {
		/// Operation label.
		operation: &'static str,
		/// Credential kind the operation was attempted on.
		kind: CredentialKind,
	},
}

/// Configuration and validation failures raised while building client credentials.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// More than one credential kind was configured.
	#[error(
		"Client secret, certificate, signed assertion, and signing credentials are mutually exclusive; {count} were configured."
	)]
	MutuallyExclusiveCredentials {
		/// Number of credential kinds found in the configuration.
		count: usize,
	},
	/// No credential kind was configured.
	#[error("A client secret, certificate, signed assertion, or signing credentials must be configured.")]
	MissingCredential,
	/// RSA key is smaller than the supported minimum.
	#[error("The certificate key is {bits} bits; at least {min} bits are required.")]
	KeyTooSmall {
		/// Observed modulus size.
		bits: usize,
		/// Minimum accepted modulus size.
		min: usize,
	},
	/// Certificate bytes could not be decoded.
	#[error("Certificate is invalid: {reason}.")]
	InvalidCertificate {
		/// Decoder-supplied reason string.
		reason: String,
	},
	/// Private key could not be decoded.
	#[error("Private key is invalid.")]
	InvalidPrivateKey {
		/// Underlying decoding failure.
		#[source]
		source: BoxError,
	},
	/// Credential settings document is malformed.
	#[error("Credential settings are invalid.")]
	InvalidSettings {
		/// Structured parsing failure including the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl ConfigError {
	/// Wraps a key decoding failure inside [`ConfigError`].
	pub fn invalid_private_key(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::InvalidPrivateKey { source: Box::new(src) }
	}
}

/// Failures reported by a signature provider while signing.
#[derive(Debug, ThisError)]
pub enum SigningError {
	/// The key handed to a provider factory is not one it understands.
	#[error("Key of type `{key_type}` is not supported by this signature provider.")]
	UnsupportedKey {
		/// Descriptive key type label.
		key_type: &'static str,
	},
	/// Backend-specific failure (HSM, remote key service, crypto library).
	#[error("Signature backend failed.")]
	Backend {
		/// Underlying backend failure.
		#[source]
		source: BoxError,
	},
}
impl SigningError {
	/// Wraps a backend failure.
	pub fn backend(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Backend { source: Box::new(src) }
	}
}
impl From<rsa::signature::Error> for SigningError {
	fn from(e: rsa::signature::Error) -> Self {
		Self::backend(e)
	}
}
