// self
use oauth2_client_auth::{
	_preludet::*,
	throttle::{
		ServiceError, ThrottleRequest, ThrottlingManager, ThrottlingProvider, UiRequiredProvider,
		UI_REQUIRED_EXPIRATION,
	},
};

fn refresh_request(account: &str, refresh_token: &str) -> ThrottleRequest {
	let authority =
		Url::parse("https://login.example.com/tenant-a").expect("Authority fixture should parse.");

	ThrottleRequest::for_authority(&authority).with_home_account_id(account).with_body([
		("client_id", "desktop-app"),
		("grant_type", "refresh_token"),
		("refresh_token", refresh_token),
		("scope", "openid profile offline_access"),
	])
}

#[test]
fn manager_replays_ui_required_failures_for_identical_requests() {
	let manager = ThrottlingManager::new();
	let request = refresh_request("uid.utid", "RT-1");
	let failure = ServiceError::ui_required("interaction_required", "AADSTS50079: enroll in MFA")
		.with_status(400);

	assert!(manager.try_throttle(&request).is_ok());

	manager.record_exception(&request, &failure);

	match manager.try_throttle(&request) {
		Err(Error::Service(replayed)) => assert_eq!(replayed, failure),
		other => panic!("Identical request should be throttled, got {other:?}."),
	}

	assert!(manager.try_throttle(&refresh_request("uid.utid", "RT-2")).is_ok());
	assert!(manager.try_throttle(&refresh_request("other.utid", "RT-1")).is_ok());
}

#[test]
fn service_failures_pass_through_the_manager() -> color_eyre::Result<()> {
	let manager = ThrottlingManager::new();
	let request = refresh_request("uid.utid", "RT-1");

	manager.record_exception(&request, &ServiceError::service("temporarily_unavailable", "busy"));
	manager.try_throttle(&request)?;

	for provider in manager.providers() {
		provider.try_throttle(&request)?;
	}

	Ok(())
}

#[test]
fn expired_entries_stop_throttling_and_are_swept_on_write() {
	let provider = UiRequiredProvider::default();
	let first = refresh_request("uid.utid", "RT-1");
	let second = refresh_request("uid.utid", "RT-2");
	let recorded_at = OffsetDateTime::now_utc() - UI_REQUIRED_EXPIRATION - Duration::seconds(1);

	provider.record_exception_at(&first, &ui_required_error("consent_required"), recorded_at);

	assert_eq!(provider.cache().len(), 1);
	assert!(provider.try_throttle(&first).is_ok());

	provider.record_exception(&second, &ui_required_error("consent_required"));

	assert_eq!(provider.cache().len(), 1);
	assert!(provider.cache().lookup(&provider.thumbprint(&first)).is_none());
	assert!(provider.try_throttle(&second).is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_record_and_throttle_agree() {
	let provider = Arc::new(UiRequiredProvider::default());
	let mut handles = Vec::new();

	for account in 0..8 {
		let provider = provider.clone();

		handles.push(tokio::spawn(async move {
			let request = refresh_request(&format!("uid-{account}.utid"), "RT");

			for _ in 0..50 {
				provider.record_exception(&request, &ui_required_error(&format!("account {account}")));

				match provider.try_throttle(&request) {
					Err(Error::Service(replayed)) =>
						assert_eq!(replayed.message, format!("account {account}")),
					other => panic!("Recorded request should be throttled, got {other:?}."),
				}

				tokio::task::yield_now().await;
			}
		}));
	}
	for handle in handles {
		handle.await.expect("Throttling task should not panic.");
	}

	assert_eq!(provider.cache().len(), 8);

	provider.reset_cache();

	assert!(provider.cache().is_empty());
}
