// std
use std::sync::atomic::{AtomicUsize, Ordering};
// crates.io
use time::macros;
// self
use oauth2_client_auth::{
	_preludet::*,
	credential::{
		CachedAssertion, ClientAuthenticator, ClientCredentialConfig, ClientCredentialSettings,
		CredentialKind,
	},
	error::{ConfigError, SigningError},
	signing::{
		RsaSecurityKey, SecurityKey, SignatureProvider, SignatureProviderFactory,
		SigningAlgorithm, SigningCredentials,
	},
};

const T0: OffsetDateTime = macros::datetime!(2025-06-01 08:00 UTC);

#[derive(Debug, Default)]
struct TrackingFactory {
	created: AtomicUsize,
	released: AtomicUsize,
}
impl SignatureProviderFactory for TrackingFactory {
	fn create_for_signing(
		&self,
		key: &dyn SecurityKey,
		algorithm: &SigningAlgorithm,
	) -> Option<Box<dyn SignatureProvider>> {
		self.created.fetch_add(1, Ordering::SeqCst);

		Some(Box::new(FixedSignature { algorithm: algorithm.clone(), key_id: key.key_id().to_owned() }))
	}

	fn release(&self, _: Box<dyn SignatureProvider>) {
		self.released.fetch_add(1, Ordering::SeqCst);
	}
}

#[derive(Debug)]
struct FixedSignature {
	algorithm: SigningAlgorithm,
	key_id: String,
}
impl SignatureProvider for FixedSignature {
	fn algorithm(&self) -> &SigningAlgorithm {
		&self.algorithm
	}

	fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SigningError> {
		let mut signature = self.key_id.as_bytes().to_vec();

		signature.extend_from_slice(message);

		Ok(signature)
	}
}

fn settings_json(value: serde_json::Value) -> ClientCredentialSettings {
	ClientCredentialSettings::from_json_str(&value.to_string())
		.expect("Credential settings fixture should parse.")
}

#[test]
fn certificate_settings_build_a_signing_authenticator() {
	let settings = settings_json(serde_json::json!({
		"certificate_pem": TEST_CERTIFICATE_PEM,
		"private_key_pem": TEST_PRIVATE_KEY_PEM,
	}));
	let config = settings.into_config().expect("Certificate settings should convert.");
	let authenticator = ClientAuthenticator::new(config).expect("Authenticator should build.");

	assert_eq!(authenticator.kind(), CredentialKind::ClientCertificate);
	assert_eq!(authenticator.algorithm(), Some(SigningAlgorithm::Rs256));
	assert_eq!(
		authenticator.key_identifier().expect("Certificates expose a key identifier."),
		TEST_CERTIFICATE_KID
	);

	let signature = authenticator.sign(b"header.payload").expect("Certificate signing should succeed.");
	let certificate = authenticator.certificate().expect("Certificate should be exposed.");

	certificate
		.key()
		.verify(&SigningAlgorithm::Rs256, b"header.payload", &signature)
		.expect("Signature should verify against the certificate key.");
}

#[test]
fn claims_in_settings_promote_the_certificate_variant() {
	let settings = settings_json(serde_json::json!({
		"certificate_pem": TEST_CERTIFICATE_PEM,
		"private_key_pem": TEST_PRIVATE_KEY_PEM,
		"claims_to_sign": { "xms_az_claim": "on" },
		"merge_with_default_claims": true,
	}));
	let authenticator = ClientAuthenticator::new(
		settings.into_config().expect("Certificate settings should convert."),
	)
	.expect("Authenticator should build.");

	assert_eq!(authenticator.kind(), CredentialKind::ClientCertificateWithClaims);
	assert!(authenticator.merge_with_default_claims());
	assert_eq!(
		authenticator.claims_to_sign().and_then(|claims| claims.get("xms_az_claim")).map(String::as_str),
		Some("on")
	);
	assert_eq!(
		authenticator.key_identifier().expect("Certificates expose a key identifier."),
		TEST_CERTIFICATE_KID
	);
}

#[test]
fn settings_with_a_foreign_private_key_are_rejected() {
	let settings = settings_json(serde_json::json!({
		"certificate_pem": TEST_CERTIFICATE_PEM,
		"private_key_pem": OTHER_PRIVATE_KEY_PEM,
	}));
	let err = settings.into_config().expect_err("Certificate and key must belong together.");

	assert!(matches!(err, ConfigError::InvalidCertificate { .. }));
}

#[test]
fn conflicting_settings_are_rejected() {
	let settings = settings_json(serde_json::json!({
		"client_secret": "s3cr3t",
		"signed_client_assertion": "eyJhbGciOi.e30.sig",
	}));
	let config = settings.into_config().expect("Settings without PEM material should convert.");
	let err = ClientAuthenticator::new(config).expect_err("Two credentials must be rejected.");

	assert!(matches!(err, Error::Config(ConfigError::MutuallyExclusiveCredentials { count: 2 })));
}

#[test]
fn empty_settings_are_rejected() {
	let config = settings_json(serde_json::json!({}))
		.into_config()
		.expect("Empty settings should convert.");
	let err = ClientAuthenticator::new(config).expect_err("No credential must be rejected.");

	assert!(matches!(err, Error::Config(ConfigError::MissingCredential)));
}

#[test]
fn signing_key_without_identifier_has_no_kid() {
	let key = RsaSecurityKey::from_pem(TEST_PRIVATE_KEY_PEM)
		.expect("RSA key fixture should decode.")
		.with_key_id("");
	let authenticator = ClientAuthenticator::new(ClientCredentialConfig::default()
		.with_signing_credentials(SigningCredentials::new(Arc::new(key), SigningAlgorithm::Rs256)))
	.expect("Authenticator should build.");

	assert!(matches!(
		authenticator.key_identifier(),
		Err(Error::NotSupported { operation: "key_identifier", kind: CredentialKind::SigningCredentials })
	));
	assert!(authenticator.sign(b"still signs").is_ok());
}

#[test]
fn explicit_factory_is_used_and_released() {
	let factory = Arc::new(TrackingFactory::default());
	let key = RsaSecurityKey::from_pem(TEST_PRIVATE_KEY_PEM)
		.expect("RSA key fixture should decode.")
		.with_key_id("my-key");
	let credentials = SigningCredentials::new(Arc::new(key), SigningAlgorithm::Rs512)
		.with_provider_factory(factory.clone());
	let authenticator = ClientAuthenticator::new(
		ClientCredentialConfig::default().with_signing_credentials(credentials),
	)
	.expect("Authenticator should build.");

	assert_eq!(authenticator.kind(), CredentialKind::SigningCredentials);
	assert_eq!(authenticator.algorithm(), Some(SigningAlgorithm::Rs512));
	assert_eq!(authenticator.key_identifier().expect("Key identifier should encode."), "bXkta2V5");
	assert_eq!(authenticator.sign(b"!").expect("Factory signing should succeed."), b"my-key!");
	assert_eq!(factory.created.load(Ordering::SeqCst), 1);
	assert_eq!(factory.released.load(Ordering::SeqCst), 1);
}

#[test]
fn key_factory_signs_with_the_configured_algorithm() {
	let key = Arc::new(RsaSecurityKey::from_pem(TEST_PRIVATE_KEY_PEM).expect("RSA key fixture should decode."));
	let authenticator = ClientAuthenticator::new(
		ClientCredentialConfig::default()
			.with_signing_credentials(SigningCredentials::new(key.clone(), SigningAlgorithm::Rs384)),
	)
	.expect("Authenticator should build.");
	let signature = authenticator.sign(b"claims").expect("RS384 signing should succeed.");

	key.verify(&SigningAlgorithm::Rs384, b"claims", &signature)
		.expect("RS384 signature should verify.");
	assert!(key.verify(&SigningAlgorithm::Rs256, b"claims", &signature).is_err());
}

#[test]
fn cached_assertion_reuse_respects_expiry_audience_and_x5c() {
	let authenticator = test_certificate_authenticator();
	let audience = "https://login.example.com/tenant-a/oauth2/v2.0/token";

	assert!(authenticator.reusable_assertion_at(audience, false, T0).is_none());

	authenticator.cache_assertion(
		CachedAssertion::new("jwt-1", T0 + Duration::minutes(10), false).with_audience(audience),
	);

	assert!(authenticator.reusable_assertion_at(audience, false, T0).is_some());
	assert!(authenticator.reusable_assertion_at(audience, true, T0).is_none());
	assert!(authenticator.reusable_assertion_at("https://other/", false, T0).is_none());
	assert!(authenticator.reusable_assertion_at(audience, false, T0 + Duration::minutes(10)).is_none());

	authenticator.clear_cached_assertion();

	assert!(authenticator.cached_assertion().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_cache_writes_never_tear() {
	let authenticator = Arc::new(test_certificate_authenticator());
	let mut handles = Vec::new();

	for writer in 0..4_i64 {
		let authenticator = authenticator.clone();

		handles.push(tokio::spawn(async move {
			for i in 0..200_i64 {
				let n = writer * 1_000 + i;

				authenticator.cache_assertion(CachedAssertion::new(
					format!("jwt-{n}"),
					T0 + Duration::seconds(n),
					n % 2 == 0,
				));
				tokio::task::yield_now().await;
			}
		}));
	}
	for _ in 0..4 {
		let authenticator = authenticator.clone();

		handles.push(tokio::spawn(async move {
			for _ in 0..200 {
				if let Some(cached) = authenticator.cached_assertion() {
					let n = (cached.valid_to - T0).whole_seconds();

					assert_eq!(cached.assertion.expose(), format!("jwt-{n}"));
					assert_eq!(cached.contains_x5c, n % 2 == 0);
				}

				tokio::task::yield_now().await;
			}
		}));
	}
	for handle in handles {
		handle.await.expect("Cache task should not panic.");
	}

	assert!(authenticator.cached_assertion().is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_signing_yields_identical_signatures() {
	let authenticator = Arc::new(test_certificate_authenticator());
	let expected = authenticator.sign(b"payload").expect("Baseline signing should succeed.");
	let mut handles = Vec::new();

	for _ in 0..8 {
		let authenticator = authenticator.clone();

		handles.push(tokio::task::spawn_blocking(move || {
			(
				authenticator.sign(b"payload").expect("Concurrent signing should succeed."),
				authenticator.key_identifier().expect("Key identifier should resolve."),
			)
		}));
	}
	for handle in handles {
		let (signature, kid) = handle.await.expect("Signing task should not panic.");

		assert_eq!(signature, expected);
		assert_eq!(kid, TEST_CERTIFICATE_KID);
	}
}
