//! ILSWS HTTP client tests against a local mock server.

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pullist_core::{
    config::PullListMode,
    testing::fixtures,
    IlsApi, IlsError, IlswsClient, Session,
};

async fn client(server: &MockServer) -> IlswsClient {
    let config = fixtures::ils_config(&format!("{}/symws", server.uri()));
    IlswsClient::new(&config).expect("Failed to create client")
}

#[tokio::test]
async fn test_login_sends_credentials_and_app_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/symws/rest/security/loginUser"))
        .and(query_param("login", "pager"))
        .and(query_param("password", "secret"))
        .and(header("x-sirs-clientID", "PULLIST"))
        .and(header("sd-originating-app-id", "pullist"))
        .and(header("accept", "application/json"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "staffKey": "S1",
            "sessionToken": "tok-123"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = client(&server).await.login("pager", "secret").await.unwrap();
    assert_eq!(token, "tok-123");
}

#[tokio::test]
async fn test_rejected_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/symws/rest/security/loginUser"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .mount(&server)
        .await;

    let result = client(&server).await.login("pager", "wrong").await;
    match result {
        Err(IlsError::LoginFailed(message)) => assert!(message.contains("bad credentials")),
        other => panic!("Expected LoginFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_pull_list_requests_mode_fields_with_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/symws/circulation/holdItemPullList/key/CEN"))
        .and(query_param("includeFields", "pullList{holdRecord,item}"))
        .and(header("x-sirs-sessionToken", "tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resource": "/circulation/holdItemPullList",
            "key": "CEN",
            "fields": {
                "pullList": [{
                    "fields": {
                        "holdRecord": { "resource": "/circulation/holdRecord", "key": "1001" },
                        "item": { "resource": "/catalog/item", "key": "55:1:1" }
                    }
                }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let record = client(&server)
        .await
        .hold_item_pull_list(&Session::new("tok-123"), "CEN", PullListMode::Thin)
        .await
        .unwrap();

    let entries = record.fields.unwrap().pull_list;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].fields.as_ref().unwrap().hold_record.key, "1001");
}

#[tokio::test]
async fn test_thick_pull_list_embeds_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/symws/circulation/holdItemPullList/key/CEN"))
        .and(query_param(
            "includeFields",
            "pullList{holdRecord{holdType,status},item{call{bib{title,author,titleControlNumber},callNumber,volumetric},barcode,currentLocation{description}}}",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "key": "CEN",
            "fields": { "pullList": [] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let record = client(&server)
        .await
        .hold_item_pull_list(&Session::new("tok"), "CEN", PullListMode::Thick)
        .await
        .unwrap();
    assert!(record.fields.unwrap().pull_list.is_empty());
}

#[tokio::test]
async fn test_item_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/symws/catalog/item/key/12345"))
        .and(query_param("includeFields", "barcode,call,currentLocation{description}"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resource": "/catalog/item",
            "key": "12345",
            "fields": {
                "barcode": "31234000012345",
                "call": { "resource": "/catalog/call", "key": "555" },
                "currentLocation": {
                    "resource": "/policy/location",
                    "key": "STACKS",
                    "fields": { "description": "Adult stacks" }
                }
            }
        })))
        .mount(&server)
        .await;

    let item = client(&server)
        .await
        .item(&Session::new("tok"), "12345")
        .await
        .unwrap();
    let fields = item.fields.unwrap();
    assert_eq!(fields.barcode.as_deref(), Some("31234000012345"));
    assert_eq!(fields.call.unwrap().key, "555");
}

#[tokio::test]
async fn test_server_error_becomes_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/symws/catalog/bib/key/77"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .mount(&server)
        .await;

    let result = client(&server).await.bib(&Session::new("tok"), "77").await;
    match result {
        Err(IlsError::Api { status, message }) => {
            assert_eq!(status, 500);
            assert!(message.contains("database unavailable"));
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/symws/user/patron/key/9"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let result = client(&server).await.patron(&Session::new("tok"), "9").await;
    assert!(matches!(result, Err(IlsError::ParseError(_))));
}

#[tokio::test]
async fn test_connection_refused() {
    let config = fixtures::ils_config("http://127.0.0.1:1/symws");
    let client = IlswsClient::new(&config).unwrap();
    let result = client.call(&Session::new("tok"), "1").await;
    assert!(matches!(
        result,
        Err(IlsError::ConnectionFailed(_)) | Err(IlsError::Http(_))
    ));
}
