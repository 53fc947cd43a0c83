//! X.509 client certificates paired with their RSA private keys.

// crates.io
use base64::{
	Engine as _,
	engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use rsa::{
	RsaPrivateKey, RsaPublicKey,
	pkcs8::{DecodePublicKey, der::pem},
};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use x509_cert::{
	Certificate,
	der::{Decode, Encode},
};
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	signing::{RsaSecurityKey, SecurityKey, SigningAlgorithm, SigningCredentials},
};

/// Minimum RSA modulus size accepted for client certificates.
pub const MIN_KEY_SIZE_BITS: usize = 2048;

const CERTIFICATE_LABEL: &str = "CERTIFICATE";
const DER_SEQUENCE_TAG: u8 = 0x30;

/// DER encoded certificate plus the private key that signs on its behalf.
///
/// The certificate is parsed once to check that its subject public key belongs to the private
/// key. Afterwards the DER bytes only feed the `x5t`/`x5t#S256` thumbprints and the `x5c` chain,
/// while signing goes through the RSA key with `RS256`.
#[derive(Clone)]
pub struct ClientCertificate {
	der: Arc<[u8]>,
	key: Arc<RsaSecurityKey>,
}
impl ClientCertificate {
	/// Pairs DER certificate bytes with an RSA private key.
	pub fn from_der(
		der: impl Into<Vec<u8>>,
		private_key: RsaPrivateKey,
	) -> Result<Self, ConfigError> {
		Self::from_parts(der.into(), RsaSecurityKey::new(private_key))
	}

	/// Decodes a PEM `CERTIFICATE` block and a PKCS#8 or PKCS#1 PEM private key.
	pub fn from_pem(certificate_pem: &str, private_key_pem: &str) -> Result<Self, ConfigError> {
		let (label, der) = pem::decode_vec(certificate_pem.as_bytes())
			.map_err(|e| ConfigError::InvalidCertificate { reason: e.to_string() })?;

		if label != CERTIFICATE_LABEL {
			return Err(ConfigError::InvalidCertificate {
				reason: format!("unexpected PEM label `{label}`"),
			});
		}

		Self::from_parts(der, RsaSecurityKey::from_pem(private_key_pem)?)
	}

	fn from_parts(der: Vec<u8>, key: RsaSecurityKey) -> Result<Self, ConfigError> {
		if der.first() != Some(&DER_SEQUENCE_TAG) {
			return Err(ConfigError::InvalidCertificate {
				reason: "certificate is not a DER sequence".into(),
			});
		}

		let bits = key.key_size_bits();

		if bits < MIN_KEY_SIZE_BITS {
			return Err(ConfigError::KeyTooSmall { bits, min: MIN_KEY_SIZE_BITS });
		}
		if subject_public_key(&der)? != key.public_key() {
			return Err(ConfigError::InvalidCertificate {
				reason: "certificate public key does not match the private key".into(),
			});
		}

		let der: Arc<[u8]> = Arc::from(der);
		let key = key.with_key_id(sha1_thumbprint(&der));

		Ok(Self { der, key: Arc::new(key) })
	}

	/// DER bytes of the certificate.
	pub fn der(&self) -> &[u8] {
		&self.der
	}

	/// Base64url (no padding) SHA-1 digest of the certificate DER, the `x5t` value and the
	/// certificate `kid`.
	pub fn thumbprint(&self) -> String {
		sha1_thumbprint(&self.der)
	}

	/// Base64url (no padding) SHA-256 digest of the certificate DER, the `x5t#S256` value.
	pub fn thumbprint_sha256(&self) -> String {
		URL_SAFE_NO_PAD.encode(Sha256::digest(&self.der))
	}

	/// Standard base64 DER, the form carried in an `x5c` header entry.
	pub fn x5c(&self) -> String {
		STANDARD.encode(&self.der)
	}

	/// RSA key paired with the certificate.
	pub fn key(&self) -> &RsaSecurityKey {
		&self.key
	}

	/// Signing credentials the certificate signs with (`RS256`, built-in RSA provider).
	pub fn signing_credentials(&self) -> SigningCredentials {
		SigningCredentials::new(self.key.clone(), SigningAlgorithm::Rs256)
	}
}
impl Debug for ClientCertificate {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientCertificate")
			.field("thumbprint", &self.thumbprint())
			.field("key", &self.key)
			.finish()
	}
}

fn sha1_thumbprint(der: &[u8]) -> String {
	URL_SAFE_NO_PAD.encode(Sha1::digest(der))
}

fn subject_public_key(der: &[u8]) -> Result<RsaPublicKey, ConfigError> {
	let certificate = Certificate::from_der(der)
		.map_err(|e| ConfigError::InvalidCertificate { reason: e.to_string() })?;
	let spki = certificate
		.tbs_certificate
		.subject_public_key_info
		.to_der()
		.map_err(|e| ConfigError::InvalidCertificate { reason: e.to_string() })?;

	RsaPublicKey::from_public_key_der(&spki).map_err(|e| ConfigError::InvalidCertificate {
		reason: format!("certificate does not carry an RSA public key: {e}"),
	})
}
