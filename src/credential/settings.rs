//! Serde-friendly credential settings for applications that load configuration from files or
//! environment-provided JSON.

// self
use crate::{
	_prelude::*,
	auth::ClientSecret,
	credential::{ClientCertificate, ClientCredentialConfig},
	error::ConfigError,
};

/// Declarative credential settings; converted into a [`ClientCredentialConfig`] with
/// [`into_config`](Self::into_config).
///
/// Signing credentials backed by external key services cannot be expressed declaratively and
/// must be attached with [`ClientCredentialConfig::with_signing_credentials`].
#[derive(Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientCredentialSettings {
	/// Shared client secret.
	pub client_secret: Option<ClientSecret>,
	/// PEM `CERTIFICATE` block.
	pub certificate_pem: Option<String>,
	/// PKCS#8 or PKCS#1 PEM private key matching `certificate_pem`.
	pub private_key_pem: Option<ClientSecret>,
	/// Extra claims to sign alongside the certificate.
	pub claims_to_sign: BTreeMap<String, String>,
	/// Whether `claims_to_sign` extends the default claims.
	pub merge_with_default_claims: bool,
	/// Caller-supplied signed assertion.
	pub signed_client_assertion: Option<ClientSecret>,
}
impl ClientCredentialSettings {
	/// Parses settings from JSON, reporting the path of the first malformed field.
	pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
		let mut deserializer = serde_json::Deserializer::from_str(json);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| ConfigError::InvalidSettings { source })
	}

	/// Decodes PEM material and produces the programmatic configuration.
	pub fn into_config(self) -> Result<ClientCredentialConfig, ConfigError> {
		let certificate = match (self.certificate_pem, self.private_key_pem) {
			(Some(cert), Some(key)) => Some(ClientCertificate::from_pem(&cert, key.expose())?),
			(None, None) => None,
			(Some(_), None) =>
				return Err(ConfigError::InvalidCertificate {
					reason: "private_key_pem is required with certificate_pem".into(),
				}),
			(None, Some(_)) =>
				return Err(ConfigError::InvalidCertificate {
					reason: "certificate_pem is required with private_key_pem".into(),
				}),
		};
		let claims_to_sign =
			if self.claims_to_sign.is_empty() { None } else { Some(self.claims_to_sign) };

		Ok(ClientCredentialConfig {
			client_secret: self.client_secret,
			certificate,
			claims_to_sign,
			merge_with_default_claims: self.merge_with_default_claims,
			signed_client_assertion: self.signed_client_assertion,
			signing_credentials: None,
		})
	}
}
impl Debug for ClientCredentialSettings {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientCredentialSettings")
			.field("client_secret_set", &self.client_secret.is_some())
			.field("certificate_set", &self.certificate_pem.is_some())
			.field("claims_to_sign", &self.claims_to_sign.keys().collect::<Vec<_>>())
			.field("merge_with_default_claims", &self.merge_with_default_claims)
			.field("signed_client_assertion_set", &self.signed_client_assertion.is_some())
			.finish()
	}
}
