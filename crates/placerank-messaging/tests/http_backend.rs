//! Integration tests for `HttpMessagingBackend` using wiremock HTTP mocks.

use std::time::Duration;

use placerank_messaging::{
    run_campaign, CampaignPlan, CampaignSettings, CampaignState, Contact, ContactId,
    FriendRequestStatus, FriendRequestTicket, HttpMessagingBackend, MessageTemplate,
    MessagingBackend, MessagingError, RenderOptions, RetryPolicy,
};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_backend(base_url: &str) -> HttpMessagingBackend {
    HttpMessagingBackend::new(base_url, Some("test-token"), 5)
        .expect("backend construction should not fail")
}

fn settings() -> CampaignSettings {
    CampaignSettings {
        poll_interval: Duration::from_millis(5),
        friend_confirm_timeout: Duration::from_secs(2),
        retry: RetryPolicy {
            max_retries: 1,
            backoff_base: Duration::ZERO,
            max_delay: Duration::ZERO,
        },
        render: RenderOptions::default(),
    }
}

#[tokio::test]
async fn ensure_friends_posts_contact_ids_with_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/kakao/friends/ensure"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(serde_json::json!({ "contact_ids": ["c1", "c2"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ticket": "req-42"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = test_backend(&server.uri());
    let ticket = backend
        .ensure_friends(&[ContactId("c1".into()), ContactId("c2".into())])
        .await
        .expect("should return ticket");
    assert_eq!(ticket, FriendRequestTicket("req-42".into()));
}

#[tokio::test]
async fn friend_request_status_parses_completed_with_failures() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/kakao/friends/requests/req-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "completed",
            "failed": ["c2"]
        })))
        .mount(&server)
        .await;

    let backend = test_backend(&server.uri());
    let status = backend
        .friend_request_status(&FriendRequestTicket("req-42".into()))
        .await
        .unwrap();
    assert_eq!(
        status,
        FriendRequestStatus::Completed {
            failed: vec![ContactId("c2".into())]
        }
    );
}

#[tokio::test]
async fn client_error_maps_to_api_error_with_backend_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/kakao/messages"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "message": "template not approved"
        })))
        .mount(&server)
        .await;

    let backend = test_backend(&server.uri());
    let err = backend
        .send_message(&ContactId("c1".into()), &["hi".to_string()])
        .await
        .unwrap_err();
    assert!(
        matches!(err, MessagingError::Api { status: 400, ref message } if message == "template not approved"),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn malformed_status_body_is_a_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/kakao/friends/requests/req-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let backend = test_backend(&server.uri());
    let err = backend
        .friend_request_status(&FriendRequestTicket("req-1".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, MessagingError::Deserialize { .. }));
}

#[tokio::test]
async fn campaign_runs_end_to_end_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/kakao/friends/ensure"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ticket": "req-7" })),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/kakao/friends/requests/req-7"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "status": "completed", "failed": [] })),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/kakao/messages"))
        .and(body_json(serde_json::json!({
            "contact_id": "c1",
            "parts": ["최유진님, 예약이 확정되었습니다."]
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let plan = CampaignPlan {
        template: MessageTemplate {
            name: "booking".into(),
            parts: vec!["#{name}님, 예약이 확정되었습니다.".into()],
        },
        contacts: vec![Contact {
            id: ContactId("c1".into()),
            name: "최유진".into(),
            phone: None,
        }],
    };

    let backend = test_backend(&server.uri());
    let report = run_campaign(&backend, &plan, &settings()).await.unwrap();
    assert_eq!(report.state, CampaignState::Done);
    assert_eq!(report.sent, vec![ContactId("c1".into())]);
}

#[tokio::test]
async fn transient_server_error_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/kakao/friends/ensure"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/kakao/friends/ensure"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ticket": "req-9" })),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/kakao/friends/requests/req-9"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "completed" })),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/kakao/messages"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let plan = CampaignPlan {
        template: MessageTemplate {
            name: "notice".into(),
            parts: vec!["공지".into()],
        },
        contacts: vec![Contact {
            id: ContactId("c9".into()),
            name: String::new(),
            phone: None,
        }],
    };

    let backend = test_backend(&server.uri());
    let report = run_campaign(&backend, &plan, &settings()).await.unwrap();
    assert_eq!(report.state, CampaignState::Done);
    assert_eq!(report.sent.len(), 1);
}
