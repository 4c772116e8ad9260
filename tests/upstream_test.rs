//! Wiremock integration tests for [`ForumClient`].
//!
//! Checks the request each operation sends (path, query text, auth headers)
//! and how upstream failures are mapped.

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use discourse_relay::{Credentials, ForumApi, ForumClient, PostsQuery, RelayError, SearchType};

fn client(server: &MockServer) -> ForumClient {
    ForumClient::new(server.uri())
        .unwrap()
        .credentials(Credentials::new("test-key", "system"))
}

async fn mount_search(server: &MockServer, q: &str) {
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("q", q))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "q": q })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn search_sends_auth_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("q", "rust"))
        .and(header("Api-Key", "test-key"))
        .and(header("Api-Username", "system"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "posts": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let body = client(&server).search("rust").await.unwrap();
    assert_eq!(body, json!({ "posts": [] }));
}

#[tokio::test]
async fn requests_identify_the_relay() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(header("User-Agent", discourse_relay::user_agent().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).search("x").await.unwrap();
    assert!(discourse_relay::user_agent().starts_with("discourse-relay/"));
}

#[tokio::test]
async fn anonymous_client_omits_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/t/7.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 7 })))
        .mount(&server)
        .await;

    let anon = ForumClient::new(server.uri()).unwrap();
    anon.topic("7").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("Api-Key").is_none());
}

#[tokio::test]
async fn topic_and_category_paths() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/t/42.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 42, "title": "Hello" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/c/3.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "category": { "id": 3 } })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server);
    assert_eq!(api.topic("42").await.unwrap()["title"], "Hello");
    assert_eq!(api.category("3").await.unwrap()["category"]["id"], 3);
}

#[tokio::test]
async fn category_slug_is_forwarded_as_path_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/c/support.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "category": { "slug": "support" } })))
        .expect(1)
        .mount(&server)
        .await;

    let body = client(&server).category("support").await.unwrap();
    assert_eq!(body["category"]["slug"], "support");
}

#[tokio::test]
async fn path_breaking_id_is_rejected_before_sending() {
    let server = MockServer::start().await;

    let api = client(&server);
    for id in ["a/b", "..", "", "1?x=2"] {
        let err = api.topic(id).await.unwrap_err();
        assert!(matches!(err, RelayError::InvalidInput(_)), "{id:?}: {err:?}");
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn posts_forwards_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts.json"))
        .and(query_param("topic_id", "5"))
        .and(query_param("before", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "latest_posts": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let mut params = PostsQuery::new();
    params.insert("topic_id".into(), "5".into());
    params.insert("before".into(), "100".into());
    client(&server).posts(&params).await.unwrap();
}

#[tokio::test]
async fn advanced_search_rewrites_query() {
    let server = MockServer::start().await;
    mount_search(&server, "foo in:title,first").await;
    mount_search(&server, "foo #category").await;
    mount_search(&server, "foo").await;

    let api = client(&server);
    api.advanced_search("foo", &SearchType::Topic).await.unwrap();
    api.advanced_search("foo", &SearchType::Category).await.unwrap();
    api.advanced_search("foo", &SearchType::parse("users"))
        .await
        .unwrap();
}

#[tokio::test]
async fn category_and_tag_search_queries() {
    let server = MockServer::start().await;
    mount_search(&server, "install #articles").await;
    mount_search(&server, "tags:rust").await;
    mount_search(&server, "async tags:rust").await;

    let api = client(&server);
    api.search_category("articles", "install").await.unwrap();
    api.search_tags("rust", None).await.unwrap();
    api.search_tags("rust", Some("async")).await.unwrap();
}

#[tokio::test]
async fn non_success_status_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/t/999.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client(&server).topic("999").await.unwrap_err();
    match err {
        RelayError::Api { status, ref message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Request failed with status code 404");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert!(err.is_upstream());
}

#[tokio::test]
async fn unreachable_upstream_is_http_error() {
    // Bind then drop a server so the port is closed.
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };
    let api = ForumClient::new(uri).unwrap();
    let err = api.search("x").await.unwrap_err();
    assert!(matches!(err, RelayError::Http(_)));
}

#[tokio::test]
async fn invalid_json_body_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client(&server).search("x").await.unwrap_err();
    assert!(matches!(err, RelayError::Http(_)));
}
