use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use vault_admin::config::StoreConfig;
use vault_admin::error::{AdminError, UpstreamError};
use vault_admin::schema::{AppRole, BackendKind, Identity, UserpassUser};
use vault_admin::services::users::{delete_identity, list_identities};
use vault_admin::store::{StoreHandle, VaultClient};

const TOKEN: &str = "s.directory";

fn handle_for(server: &ServerGuard) -> StoreHandle {
    let client = VaultClient::new(&StoreConfig::new(server.url())).unwrap();
    StoreHandle::new(client, TOKEN)
}

/// Mocks that fail the test if any request reaches the store.
async fn forbid_store_calls(server: &mut ServerGuard) -> Vec<mockito::Mock> {
    let mut mocks = Vec::new();
    for method in ["GET", "POST", "DELETE"] {
        mocks.push(
            server
                .mock(method, Matcher::Any)
                .expect(0)
                .create_async()
                .await,
        );
    }
    mocks
}

#[tokio::test]
async fn userpass_listing_keeps_broken_entry_partial() {
    let mut server = Server::new_async().await;
    let list = server
        .mock("GET", "/v1/auth/userpass/users?list=true")
        .match_header("X-Vault-Token", TOKEN)
        .with_status(200)
        .with_body(json!({"data": {"keys": ["u1", "u2"]}}).to_string())
        .create_async()
        .await;
    let u1 = server
        .mock("GET", "/v1/auth/userpass/users/u1")
        .with_status(200)
        .with_body(
            json!({"data": {"ttl": 3600, "max_ttl": 7200, "policies": "default,dev"}}).to_string(),
        )
        .create_async()
        .await;
    let u2 = server
        .mock("GET", "/v1/auth/userpass/users/u2")
        .with_status(500)
        .with_body(r#"{"errors":["internal error"]}"#)
        .create_async()
        .await;

    let identities = list_identities(&handle_for(&server), "userpass").await.unwrap();

    assert_eq!(
        identities,
        vec![
            Identity::Userpass(UserpassUser {
                name: "u1".into(),
                ttl: 3600,
                max_ttl: 7200,
                policies: "default,dev".into(),
            }),
            Identity::Userpass(UserpassUser::partial("u2")),
        ]
    );
    list.assert_async().await;
    u1.assert_async().await;
    u2.assert_async().await;
}

#[tokio::test]
async fn approle_listing_preserves_store_order() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v1/auth/approle/role?list=true")
        .with_status(200)
        .with_body(json!({"data": {"keys": ["web", "ci"]}}).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/v1/auth/approle/role/web")
        .with_status(200)
        .with_body(
            json!({"data": {
                "token_ttl": 600,
                "token_policies": ["web"],
                "bind_secret_id": true,
                "secret_id_num_uses": 0
            }})
            .to_string(),
        )
        .create_async()
        .await;
    // detail payload that is not a mapping
    server
        .mock("GET", "/v1/auth/approle/role/ci")
        .with_status(200)
        .with_body(json!({"data": ["unexpected"]}).to_string())
        .create_async()
        .await;

    let identities = list_identities(&handle_for(&server), "approle").await.unwrap();

    assert_eq!(identities.len(), 2);
    assert_eq!(identities[0].key(), "web");
    assert_eq!(identities[1].key(), "ci");
    match &identities[0] {
        Identity::Approle(role) => {
            assert_eq!(role.token_ttl, 600);
            assert_eq!(role.policies, vec!["web"]);
            assert!(role.bind_secret_id);
        }
        other => panic!("unexpected record: {other:?}"),
    }
    assert_eq!(identities[1], Identity::Approle(AppRole::partial("ci")));
}

#[tokio::test]
async fn listing_failure_is_passed_through() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v1/auth/userpass/users?list=true")
        .with_status(403)
        .with_body(r#"{"errors":["permission denied"]}"#)
        .create_async()
        .await;

    let err = list_identities(&handle_for(&server), "userpass")
        .await
        .unwrap_err();
    match err {
        AdminError::Upstream(UpstreamError::Status { status, errors }) => {
            assert_eq!(status, 403);
            assert_eq!(errors, vec!["permission denied"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn listing_without_key_sequence_is_conversion_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v1/auth/userpass/users?list=true")
        .with_status(200)
        .with_body(json!({"data": {"keys": {"u1": true}}}).to_string())
        .create_async()
        .await;

    let err = list_identities(&handle_for(&server), "userpass")
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::DataConversion(_)));
}

#[tokio::test]
async fn listing_without_data_is_conversion_error() {
    let mut server = Server::new_async().await;
    let list = server
        .mock("GET", "/v1/auth/userpass/users?list=true")
        .with_status(200)
        .with_body(json!({"request_id": "r1"}).to_string())
        .create_async()
        .await;
    let details = server
        .mock("GET", Matcher::Regex(r"^/v1/auth/userpass/users/".into()))
        .expect(0)
        .create_async()
        .await;

    let err = list_identities(&handle_for(&server), "userpass")
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::DataConversion(_)));
    list.assert_async().await;
    details.assert_async().await;
}

#[tokio::test]
async fn listing_with_null_data_is_conversion_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v1/auth/approle/role?list=true")
        .with_status(200)
        .with_body(json!({"request_id": "r2", "data": null}).to_string())
        .create_async()
        .await;

    let err = list_identities(&handle_for(&server), "approle")
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::DataConversion(_)));
}

#[tokio::test]
async fn all_zero_detail_is_a_fetched_record() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v1/auth/userpass/users?list=true")
        .with_status(200)
        .with_body(json!({"data": {"keys": ["idle"]}}).to_string())
        .create_async()
        .await;
    let detail = server
        .mock("GET", "/v1/auth/userpass/users/idle")
        .with_status(200)
        .with_body(json!({"data": {"ttl": 0, "max_ttl": 0, "policies": ""}}).to_string())
        .create_async()
        .await;

    let identities = list_identities(&handle_for(&server), "userpass").await.unwrap();

    assert_eq!(
        identities,
        vec![Identity::Userpass(UserpassUser {
            name: "idle".into(),
            ttl: 0,
            max_ttl: 0,
            policies: String::new(),
        })]
    );
    detail.assert_async().await;
}

#[tokio::test]
async fn empty_backend_lists_nothing() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v1/auth/userpass/users?list=true")
        .with_status(404)
        .with_body(r#"{"errors":[]}"#)
        .create_async()
        .await;

    let identities = list_identities(&handle_for(&server), "userpass").await.unwrap();
    assert!(identities.is_empty());
}

#[tokio::test]
async fn unknown_backend_never_reaches_store() {
    let mut server = Server::new_async().await;
    let guards = forbid_store_calls(&mut server).await;
    let handle = handle_for(&server);

    for backend in ["ldap", "github", "", "USERPASS"] {
        let err = list_identities(&handle, backend).await.unwrap_err();
        assert!(matches!(err, AdminError::BackendUnsupported(_)));

        let err = delete_identity(&handle, backend, "someone").await.unwrap_err();
        assert!(matches!(err, AdminError::BackendUnsupported(_)));
    }

    for guard in guards {
        guard.assert_async().await;
    }
}

#[tokio::test]
async fn empty_id_is_rejected_for_every_backend() {
    let mut server = Server::new_async().await;
    let guards = forbid_store_calls(&mut server).await;
    let handle = handle_for(&server);

    let kinds = BackendKind::ALL.iter().map(|k| k.as_str());
    for backend in kinds.chain(["ldap"]) {
        let err = delete_identity(&handle, backend, "").await.unwrap_err();
        assert!(
            matches!(err, AdminError::Validation(_)),
            "{backend}: {err:?}"
        );
    }

    for guard in guards {
        guard.assert_async().await;
    }
}

#[tokio::test]
async fn multi_segment_id_is_rejected() {
    let mut server = Server::new_async().await;
    let guards = forbid_store_calls(&mut server).await;

    let err = delete_identity(&handle_for(&server), "userpass", "../../sys/mounts/secret")
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::Validation(_)));

    for guard in guards {
        guard.assert_async().await;
    }
}

#[tokio::test]
async fn delete_hits_backend_path() {
    let mut server = Server::new_async().await;
    let userpass = server
        .mock("DELETE", "/v1/auth/userpass/users/alice")
        .match_header("X-Vault-Token", TOKEN)
        .with_status(204)
        .create_async()
        .await;
    let approle = server
        .mock("DELETE", "/v1/auth/approle/role/ci")
        .with_status(204)
        .create_async()
        .await;

    let handle = handle_for(&server);
    delete_identity(&handle, "userpass", "alice").await.unwrap();
    delete_identity(&handle, "approle", "ci").await.unwrap();

    userpass.assert_async().await;
    approle.assert_async().await;
}

#[tokio::test]
async fn delete_error_is_passed_through() {
    let mut server = Server::new_async().await;
    server
        .mock("DELETE", "/v1/auth/userpass/users/alice")
        .with_status(403)
        .with_body(r#"{"errors":["1 error occurred:\n\t* permission denied\n\n"]}"#)
        .create_async()
        .await;

    let err = delete_identity(&handle_for(&server), "userpass", "alice")
        .await
        .unwrap_err();
    match err {
        AdminError::Upstream(up) => assert_eq!(up.status(), Some(403)),
        other => panic!("unexpected error: {other:?}"),
    }
}
