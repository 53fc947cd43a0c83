//! Built-in RSA signing backend (`RS256`, `RS384`, `RS512`).

// std
use std::any::Any;
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rsa::{
	RsaPrivateKey, RsaPublicKey,
	pkcs1::DecodeRsaPrivateKey,
	pkcs1v15::{Signature, SigningKey, VerifyingKey},
	pkcs8::DecodePrivateKey,
	signature::{SignatureEncoding, Signer, Verifier},
	traits::PublicKeyParts,
};
use sha2::{Digest, Sha256, Sha384, Sha512};
// self
use crate::{
	_prelude::*,
	error::{ConfigError, SigningError},
	signing::{SecurityKey, SignatureProvider, SignatureProviderFactory, SigningAlgorithm},
};

/// In-process RSA private key.
///
/// Unless overridden with [`with_key_id`](Self::with_key_id), the key id is the RFC 7638 JWK
/// thumbprint of the public key.
#[derive(Clone)]
pub struct RsaSecurityKey {
	key_id: String,
	private_key: RsaPrivateKey,
}
impl RsaSecurityKey {
	/// Wraps an RSA private key.
	pub fn new(private_key: RsaPrivateKey) -> Self {
		let key_id = jwk_thumbprint(&private_key.to_public_key());

		Self { key_id, private_key }
	}

	/// Decodes a PKCS#8 (`PRIVATE KEY`) or PKCS#1 (`RSA PRIVATE KEY`) PEM document.
	pub fn from_pem(pem: &str) -> Result<Self, ConfigError> {
		let private_key = RsaPrivateKey::from_pkcs8_pem(pem)
			.or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
			.map_err(ConfigError::invalid_private_key)?;

		Ok(Self::new(private_key))
	}

	/// Overrides the key id.
	pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
		self.key_id = key_id.into();

		self
	}

	/// Returns the private key.
	pub fn private_key(&self) -> &RsaPrivateKey {
		&self.private_key
	}

	/// Derives the public half of the key.
	pub fn public_key(&self) -> RsaPublicKey {
		self.private_key.to_public_key()
	}

	/// Verifies `signature` over `message` with the public half of the key.
	pub fn verify(
		&self,
		algorithm: &SigningAlgorithm,
		message: &[u8],
		signature: &[u8],
	) -> Result<(), SigningError> {
		let public_key = self.public_key();
		let signature = Signature::try_from(signature)?;

		match algorithm {
			SigningAlgorithm::Rs256 =>
				VerifyingKey::<Sha256>::new(public_key).verify(message, &signature)?,
			SigningAlgorithm::Rs384 =>
				VerifyingKey::<Sha384>::new(public_key).verify(message, &signature)?,
			SigningAlgorithm::Rs512 =>
				VerifyingKey::<Sha512>::new(public_key).verify(message, &signature)?,
			SigningAlgorithm::Other(_) =>
				return Err(SigningError::UnsupportedKey { key_type: self.key_type() }),
		}

		Ok(())
	}
}
impl SecurityKey for RsaSecurityKey {
	fn key_id(&self) -> &str {
		&self.key_id
	}

	fn key_type(&self) -> &'static str {
		"RSA"
	}

	fn key_size_bits(&self) -> usize {
		self.private_key.size() * 8
	}

	fn provider_factory(&self) -> Option<Arc<dyn SignatureProviderFactory>> {
		Some(Arc::new(RsaProviderFactory))
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}
impl Debug for RsaSecurityKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RsaSecurityKey")
			.field("key_id", &self.key_id)
			.field("bits", &self.key_size_bits())
			.field("private_key", &"<redacted>")
			.finish()
	}
}

/// Factory producing PKCS#1 v1.5 signature providers for [`RsaSecurityKey`].
#[derive(Clone, Copy, Debug, Default)]
pub struct RsaProviderFactory;
impl SignatureProviderFactory for RsaProviderFactory {
	fn create_for_signing(
		&self,
		key: &dyn SecurityKey,
		algorithm: &SigningAlgorithm,
	) -> Option<Box<dyn SignatureProvider>> {
		let key = key.as_any().downcast_ref::<RsaSecurityKey>()?.private_key.clone();
		let signer = match algorithm {
			SigningAlgorithm::Rs256 => RsaSigner::Sha256(SigningKey::new(key)),
			SigningAlgorithm::Rs384 => RsaSigner::Sha384(SigningKey::new(key)),
			SigningAlgorithm::Rs512 => RsaSigner::Sha512(SigningKey::new(key)),
			SigningAlgorithm::Other(_) => return None,
		};

		Some(Box::new(RsaSignatureProvider { algorithm: algorithm.clone(), signer }))
	}

	fn release(&self, provider: Box<dyn SignatureProvider>) {
		drop(provider);
	}
}

enum RsaSigner {
	Sha256(SigningKey<Sha256>),
	Sha384(SigningKey<Sha384>),
	Sha512(SigningKey<Sha512>),
}

struct RsaSignatureProvider {
	algorithm: SigningAlgorithm,
	signer: RsaSigner,
}
impl SignatureProvider for RsaSignatureProvider {
	fn algorithm(&self) -> &SigningAlgorithm {
		&self.algorithm
	}

	fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, SigningError> {
		let signature = match &self.signer {
			RsaSigner::Sha256(key) => key.try_sign(payload)?,
			RsaSigner::Sha384(key) => key.try_sign(payload)?,
			RsaSigner::Sha512(key) => key.try_sign(payload)?,
		};

		Ok(signature.to_vec())
	}
}

fn jwk_thumbprint(public_key: &RsaPublicKey) -> String {
	let e = URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be());
	let n = URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be());
	let canonical = format!("{{\"e\":\"{e}\",\"kty\":\"RSA\",\"n\":\"{n}\"}}");

	URL_SAFE_NO_PAD.encode(Sha256::digest(canonical.as_bytes()))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::{TEST_PRIVATE_KEY_PEM, WEAK_PRIVATE_KEY_PEM};

	fn fixture_key() -> RsaSecurityKey {
		RsaSecurityKey::from_pem(TEST_PRIVATE_KEY_PEM).expect("RSA key fixture should decode.")
	}

	#[test]
	fn pem_fixtures_report_key_sizes() {
		assert_eq!(fixture_key().key_size_bits(), 2048);

		let weak = RsaSecurityKey::from_pem(WEAK_PRIVATE_KEY_PEM)
			.expect("Weak RSA key fixture should still decode.");

		assert_eq!(weak.key_size_bits(), 1024);
		assert!(matches!(
			RsaSecurityKey::from_pem("not a key"),
			Err(ConfigError::InvalidPrivateKey { .. })
		));
	}

	#[test]
	fn default_key_id_is_stable_thumbprint() {
		let first = fixture_key();
		let second = fixture_key();

		assert_eq!(first.key_id(), second.key_id());
		assert_eq!(first.key_id().len(), 43, "SHA-256 base64url without padding is 43 chars.");
		assert_eq!(first.with_key_id("custom").key_id(), "custom");
	}

	#[test]
	fn provider_signatures_verify_for_each_algorithm() {
		let key = fixture_key();
		let factory = RsaProviderFactory;

		for algorithm in [SigningAlgorithm::Rs256, SigningAlgorithm::Rs384, SigningAlgorithm::Rs512]
		{
			let provider = factory
				.create_for_signing(&key, &algorithm)
				.expect("RSA factory should support RS* algorithms.");
			let signature = provider.sign(b"abc").expect("RSA signing should succeed.");

			assert_eq!(provider.algorithm(), &algorithm);
			assert_eq!(signature.len(), 256);
			key.verify(&algorithm, b"abc", &signature).expect("Signature should verify.");
			assert!(key.verify(&algorithm, b"abd", &signature).is_err());

			factory.release(provider);
		}
	}

	#[test]
	fn factory_rejects_foreign_algorithms() {
		let key = fixture_key();

		assert!(
			RsaProviderFactory
				.create_for_signing(&key, &SigningAlgorithm::Other("ES256".into()))
				.is_none()
		);
	}

	#[test]
	fn debug_redacts_private_key() {
		let rendered = format!("{:?}", fixture_key());

		assert!(rendered.contains("<redacted>"));
		assert!(rendered.contains("bits: 2048"));
	}
}
