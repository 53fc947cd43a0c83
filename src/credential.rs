//! Client credential material: the five mutually exclusive ways a confidential client proves
//! its identity to a token endpoint.
//!
//! [`ClientCredentialConfig`] collects whatever the application configured; [`ClientCredential`]
//! is the validated result, holding exactly one credential kind. [`ClientAuthenticator`] wraps
//! the credential with signing, key identifiers, and the cached client assertion.

pub mod authenticator;
pub mod certificate;
pub mod settings;

pub use authenticator::*;
pub use certificate::*;
pub use settings::*;

// self
use crate::{
	_prelude::*,
	auth::ClientSecret,
	error::ConfigError,
	signing::{SigningAlgorithm, SigningCredentials},
};

/// Payload-free discriminant of [`ClientCredential`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
	/// Shared client secret.
	ClientSecret,
	/// Certificate-signed client assertion.
	ClientCertificate,
	/// Certificate-signed client assertion carrying extra claims.
	ClientCertificateWithClaims,
	/// Caller-supplied, already signed assertion.
	SignedClientAssertion,
	/// Assertion signed through arbitrary signing credentials.
	SigningCredentials,
}
impl CredentialKind {
	/// Returns a stable label suitable for span, metric, or error fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CredentialKind::ClientSecret => "client_secret",
			CredentialKind::ClientCertificate => "client_certificate",
			CredentialKind::ClientCertificateWithClaims => "client_certificate_with_claims",
			CredentialKind::SignedClientAssertion => "signed_client_assertion",
			CredentialKind::SigningCredentials => "signing_credentials",
		}
	}

	/// Returns `true` for kinds that sign assertions locally.
	pub const fn signs(self) -> bool {
		matches!(
			self,
			CredentialKind::ClientCertificate
				| CredentialKind::ClientCertificateWithClaims
				| CredentialKind::SigningCredentials
		)
	}
}
impl Display for CredentialKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Validated credential material; exactly one kind is active.
#[derive(Clone, Debug)]
pub enum ClientCredential {
	/// Shared secret compared for equality by the token endpoint.
	Secret(ClientSecret),
	/// Certificate whose key signs the client assertion.
	Certificate(ClientCertificate),
	/// Certificate plus opaque claims forwarded to the assertion builder.
	CertificateWithClaims {
		/// Signing certificate.
		certificate: ClientCertificate,
		/// Extra claims merged into the signed assertion; never interpreted here.
		claims: BTreeMap<String, String>,
		/// Whether the claims are merged with the default assertion claims.
		merge_with_default_claims: bool,
	},
	/// Pre-signed assertion passed through untouched.
	SignedAssertion(ClientSecret),
	/// Key reference + algorithm + provider factory.
	SigningCredentials(SigningCredentials),
}
impl ClientCredential {
	/// Validates `config` and selects the single configured credential kind.
	///
	/// Fails with [`ConfigError::MutuallyExclusiveCredentials`] when more than one kind is present
	/// and [`ConfigError::MissingCredential`] when none is.
	pub fn from_config(config: ClientCredentialConfig) -> Result<Self, ConfigError> {
		let count = config.credential_count();

		if count > 1 {
			return Err(ConfigError::MutuallyExclusiveCredentials { count });
		}

		let ClientCredentialConfig {
			client_secret,
			certificate,
			claims_to_sign,
			merge_with_default_claims,
			signed_client_assertion,
			signing_credentials,
		} = config;

		if let Some(secret) = client_secret.filter(|s| !s.is_blank()) {
			return Ok(Self::Secret(secret));
		}
		if let Some(certificate) = certificate {
			return Ok(match claims_to_sign.filter(|claims| !claims.is_empty()) {
				Some(claims) =>
					Self::CertificateWithClaims { certificate, claims, merge_with_default_claims },
				None => Self::Certificate(certificate),
			});
		}
		if let Some(assertion) = signed_client_assertion.filter(|s| !s.is_blank()) {
			return Ok(Self::SignedAssertion(assertion));
		}
		if let Some(credentials) = signing_credentials {
			return Ok(Self::SigningCredentials(credentials));
		}

		Err(ConfigError::MissingCredential)
	}

	/// Discriminant of the active variant.
	pub fn kind(&self) -> CredentialKind {
		match self {
			Self::Secret(_) => CredentialKind::ClientSecret,
			Self::Certificate(_) => CredentialKind::ClientCertificate,
			Self::CertificateWithClaims { .. } => CredentialKind::ClientCertificateWithClaims,
			Self::SignedAssertion(_) => CredentialKind::SignedClientAssertion,
			Self::SigningCredentials(_) => CredentialKind::SigningCredentials,
		}
	}

	/// Certificate backing the certificate-family variants.
	pub fn certificate(&self) -> Option<&ClientCertificate> {
		match self {
			Self::Certificate(certificate) | Self::CertificateWithClaims { certificate, .. } =>
				Some(certificate),
			_ => None,
		}
	}

	/// Algorithm the credential signs with, when it signs at all.
	pub fn algorithm(&self) -> Option<SigningAlgorithm> {
		match self {
			Self::Certificate(_) | Self::CertificateWithClaims { .. } =>
				Some(SigningAlgorithm::Rs256),
			Self::SigningCredentials(credentials) => Some(credentials.algorithm.clone()),
			_ => None,
		}
	}
}

/// Raw credential inputs gathered from application configuration.
#[derive(Clone, Debug, Default)]
pub struct ClientCredentialConfig {
	/// Shared client secret.
	pub client_secret: Option<ClientSecret>,
	/// Client certificate with its private key.
	pub certificate: Option<ClientCertificate>,
	/// Extra claims to sign; only meaningful alongside a certificate.
	pub claims_to_sign: Option<BTreeMap<String, String>>,
	/// Whether `claims_to_sign` extends the default claims instead of replacing them.
	pub merge_with_default_claims: bool,
	/// Caller-supplied signed assertion.
	pub signed_client_assertion: Option<ClientSecret>,
	/// Explicit signing credentials.
	pub signing_credentials: Option<SigningCredentials>,
}
impl ClientCredentialConfig {
	/// Sets the client secret.
	pub fn with_client_secret(mut self, secret: impl Into<ClientSecret>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}

	/// Sets the client certificate.
	pub fn with_certificate(mut self, certificate: ClientCertificate) -> Self {
		self.certificate = Some(certificate);

		self
	}

	/// Sets the claims signed alongside the certificate and the merge flag.
	pub fn with_claims_to_sign<I, K, V>(
		mut self,
		claims: I,
		merge_with_default_claims: bool,
	) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.claims_to_sign =
			Some(claims.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
		self.merge_with_default_claims = merge_with_default_claims;

		self
	}

	/// Sets a pre-signed client assertion.
	pub fn with_signed_client_assertion(mut self, assertion: impl Into<ClientSecret>) -> Self {
		self.signed_client_assertion = Some(assertion.into());

		self
	}

	/// Sets explicit signing credentials.
	pub fn with_signing_credentials(mut self, credentials: SigningCredentials) -> Self {
		self.signing_credentials = Some(credentials);

		self
	}

	/// Number of primary credential inputs present (blank strings do not count).
	pub fn credential_count(&self) -> usize {
		[
			self.client_secret.as_ref().is_some_and(|s| !s.is_blank()),
			self.certificate.is_some(),
			self.signed_client_assertion.as_ref().is_some_and(|s| !s.is_blank()),
			self.signing_credentials.is_some(),
		]
		.into_iter()
		.filter(|present| *present)
		.count()
	}
}

/// Client assertion produced by the envelope builder, cached with its validity window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedAssertion {
	/// Serialized, signed assertion.
	pub assertion: ClientSecret,
	/// Absolute expiry instant.
	pub valid_to: OffsetDateTime,
	/// Whether the assertion header embeds the full `x5c` certificate chain.
	pub contains_x5c: bool,
	/// Audience the assertion was minted for, when the builder records it.
	pub audience: Option<String>,
}
impl CachedAssertion {
	/// Creates a cache entry without an audience.
	pub fn new(
		assertion: impl Into<ClientSecret>,
		valid_to: OffsetDateTime,
		contains_x5c: bool,
	) -> Self {
		Self { assertion: assertion.into(), valid_to, contains_x5c, audience: None }
	}

	/// Records the audience the assertion targets.
	pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
		self.audience = Some(audience.into());

		self
	}

	/// Returns `true` if the assertion expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.valid_to
	}

	/// Returns `true` if the assertion can be reused for `audience` with the requested `x5c`
	/// mode at `instant`.
	pub fn is_reusable_at(
		&self,
		audience: &str,
		contains_x5c: bool,
		instant: OffsetDateTime,
	) -> bool {
		!self.is_expired_at(instant)
			&& self.contains_x5c == contains_x5c
			&& self.audience.as_deref().is_none_or(|cached| cached == audience)
	}
}
