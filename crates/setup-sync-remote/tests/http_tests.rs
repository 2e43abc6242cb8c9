use setup_sync::{ModelBinding, RemoteError, RemoteSource};
use setup_sync_remote::{HttpRemote, HttpRemoteConfig};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer, token: Option<&str>) -> HttpRemoteConfig {
    HttpRemoteConfig {
        base_url: server.uri(),
        token: token.map(str::to_owned),
    }
}

fn binding(model: &str) -> ModelBinding {
    ModelBinding {
        model: model.into(),
        account: "admin".into(),
        database: "prod".into(),
    }
}

#[tokio::test]
async fn fetch_bare_array_snapshot() {
    let server = MockServer::start().await;
    let fixture = include_str!("fixtures/res_partner.json");

    Mock::given(method("GET"))
        .and(path("/prod/res_partner.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(fixture, "application/json"))
        .mount(&server)
        .await;

    let remote = HttpRemote::new(config_for(&server, None));
    let records = remote.fetch_records(&binding("res.partner")).await.unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].get_str("name"), Some("My Company"));
    assert_eq!(records[2].id(), Some(26));
}

#[tokio::test]
async fn fetch_wrapped_snapshot() {
    let server = MockServer::start().await;
    let fixture = include_str!("fixtures/ir_module_module.json");

    Mock::given(method("GET"))
        .and(path("/prod/ir_module_module.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(fixture, "application/json"))
        .mount(&server)
        .await;

    let remote = HttpRemote::new(config_for(&server, None));
    let records = remote
        .fetch_records(&binding("ir.module.module"))
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[1].get_str("state"), Some("uninstalled"));
}

#[tokio::test]
async fn sends_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/prod/res_users.json"))
        .and(header("Authorization", "Bearer t0k"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("[]", "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let remote = HttpRemote::new(config_for(&server, Some("t0k")));
    let records = remote.fetch_records(&binding("res.users")).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn error_status_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/prod/res_groups.json"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let remote = HttpRemote::new(config_for(&server, None));
    let err = remote
        .fetch_records(&binding("res.groups"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RemoteError::Status { ref model, status: 403 } if model == "res.groups"
    ));
}

#[tokio::test]
async fn malformed_body_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/prod/res_country.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>", "text/html"))
        .mount(&server)
        .await;

    let remote = HttpRemote::new(config_for(&server, None));
    let err = remote
        .fetch_records(&binding("res.country"))
        .await
        .unwrap_err();

    assert!(matches!(err, RemoteError::Parse(_)));
}
