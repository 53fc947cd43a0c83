//! Client authentication facade: signing, key identifiers, and the cached client assertion.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::{
	_prelude::*,
	auth::ClientSecret,
	credential::{
		CachedAssertion, ClientCertificate, ClientCredential, ClientCredentialConfig,
		CredentialKind,
	},
	obs::{self, AuthOperation, AuthOutcome, AuthSpan},
	signing::{SigningAlgorithm, SigningCredentials},
};

/// Proves the client's identity with its configured [`ClientCredential`].
///
/// The authenticator lives as long as the configured client. Signing and key identifiers are
/// stateless; the only mutable state is the cached assertion, stored as one value behind a
/// lock so readers never see an assertion paired with another assertion's expiry.
pub struct ClientAuthenticator {
	credential: ClientCredential,
	signing: Option<SigningCredentials>,
	cached_assertion: RwLock<Option<CachedAssertion>>,
}
impl ClientAuthenticator {
	/// Validates `config` and builds the authenticator.
	pub fn new(config: ClientCredentialConfig) -> Result<Self> {
		let _span = AuthSpan::new(AuthOperation::Validate, "client_authenticator").entered();
		let credential = ClientCredential::from_config(config)?;

		Ok(Self::from_credential(credential))
	}

	/// Wraps an already validated credential.
	pub fn from_credential(credential: ClientCredential) -> Self {
		let signing = match &credential {
			ClientCredential::Certificate(certificate)
			| ClientCredential::CertificateWithClaims { certificate, .. } =>
				Some(certificate.signing_credentials()),
			ClientCredential::SigningCredentials(credentials) => Some(credentials.clone()),
			ClientCredential::Secret(_) | ClientCredential::SignedAssertion(_) => None,
		};

		Self { credential, signing, cached_assertion: RwLock::new(None) }
	}

	/// Active credential.
	pub fn credential(&self) -> &ClientCredential {
		&self.credential
	}

	/// Kind of the active credential.
	pub fn kind(&self) -> CredentialKind {
		self.credential.kind()
	}

	/// Client secret, for [`ClientCredential::Secret`].
	pub fn secret(&self) -> Option<&ClientSecret> {
		match &self.credential {
			ClientCredential::Secret(secret) => Some(secret),
			_ => None,
		}
	}

	/// Caller-supplied assertion, for [`ClientCredential::SignedAssertion`].
	pub fn signed_assertion(&self) -> Option<&ClientSecret> {
		match &self.credential {
			ClientCredential::SignedAssertion(assertion) => Some(assertion),
			_ => None,
		}
	}

	/// Certificate for the certificate-family variants.
	pub fn certificate(&self) -> Option<&ClientCertificate> {
		self.credential.certificate()
	}

	/// Extra claims forwarded to the assertion builder.
	pub fn claims_to_sign(&self) -> Option<&BTreeMap<String, String>> {
		match &self.credential {
			ClientCredential::CertificateWithClaims { claims, .. } => Some(claims),
			_ => None,
		}
	}

	/// Whether extra claims extend the default assertion claims.
	pub fn merge_with_default_claims(&self) -> bool {
		matches!(
			self.credential,
			ClientCredential::CertificateWithClaims { merge_with_default_claims: true, .. }
		)
	}

	/// Algorithm used by [`sign`](Self::sign), for signing kinds.
	pub fn algorithm(&self) -> Option<SigningAlgorithm> {
		self.credential.algorithm()
	}

	/// Signs `message` and returns the raw signature.
	///
	/// Certificates sign through the built-in RSA provider with `RS256`; signing credentials use
	/// their explicit provider factory, falling back to the key's own. The provider is released
	/// before this returns, whether signing succeeded or not.
	pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
		let kind = self.kind();
		let _span = AuthSpan::new(AuthOperation::Sign, kind.as_str()).entered();

		obs::record_sign_outcome(kind, AuthOutcome::Attempt);

		let result = match &self.signing {
			Some(credentials) => credentials.sign(message),
			None => Err(Error::NotSupported { operation: "sign", kind }),
		};
		let outcome = if result.is_ok() { AuthOutcome::Success } else { AuthOutcome::Failure };

		obs::record_sign_outcome(kind, outcome);

		result
	}

	/// Key identifier for a JWT `kid` header.
	///
	/// Certificates yield the base64url SHA-1 digest (`x5t`) of their DER bytes; signing credentials
	/// yield the base64url encoding of the key's own identifier, and fail when the key has none.
	pub fn key_identifier(&self) -> Result<String> {
		match &self.credential {
			ClientCredential::Certificate(certificate)
			| ClientCredential::CertificateWithClaims { certificate, .. } =>
				Ok(certificate.thumbprint()),
			ClientCredential::SigningCredentials(credentials) => match credentials.key.key_id() {
				"" => Err(Error::NotSupported { operation: "key_identifier", kind: self.kind() }),
				key_id => Ok(URL_SAFE_NO_PAD.encode(key_id.as_bytes())),
			},
			ClientCredential::Secret(_) | ClientCredential::SignedAssertion(_) =>
				Err(Error::NotSupported { operation: "key_identifier", kind: self.kind() }),
		}
	}

	/// Snapshot of the cached assertion.
	pub fn cached_assertion(&self) -> Option<CachedAssertion> {
		self.cached_assertion.read().clone()
	}

	/// Replaces the cached assertion as a single unit.
	pub fn cache_assertion(&self, assertion: CachedAssertion) {
		*self.cached_assertion.write() = Some(assertion);
	}

	/// Drops the cached assertion.
	pub fn clear_cached_assertion(&self) {
		self.cached_assertion.write().take();
	}

	/// Cached assertion if it can be reused for `audience` and `contains_x5c` right now.
	pub fn reusable_assertion(
		&self,
		audience: &str,
		contains_x5c: bool,
	) -> Option<CachedAssertion> {
		self.reusable_assertion_at(audience, contains_x5c, OffsetDateTime::now_utc())
	}

	/// Cached assertion if it can be reused for `audience` and `contains_x5c` at `instant`.
	pub fn reusable_assertion_at(
		&self,
		audience: &str,
		contains_x5c: bool,
		instant: OffsetDateTime,
	) -> Option<CachedAssertion> {
		self.cached_assertion
			.read()
			.as_ref()
			.filter(|cached| cached.is_reusable_at(audience, contains_x5c, instant))
			.cloned()
	}
}
impl Debug for ClientAuthenticator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientAuthenticator")
			.field("kind", &self.kind())
			.field("cached_assertion_set", &self.cached_assertion.read().is_some())
			.finish()
	}
}
