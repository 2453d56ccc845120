//! HTTP-level tests for clients extended with the `OpenAPI` handler.
//!
//! A wiremock server stands in for the service, so these run offline.

use apiful::{
    ClientError, ClientOptions, MethodsExtension, OperationDefinition, PathSchema,
    RequestOptions, Untyped, create_client, create_openapi_client, openapi,
};
use reqwest::Method;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct PetStore;

impl PathSchema for PetStore {
    const NAME: &'static str = "petStore";

    fn operations() -> &'static [OperationDefinition] {
        &[OperationDefinition {
            operation_id: "deletePet",
            method: "DELETE",
            path_template: "/pets/{id}",
            path_params: &["id"],
        }]
    }
}

#[tokio::test]
async fn handler_resolves_path_params_and_forwards_options() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/pets/42/photos"))
        .and(query_param("size", "small"))
        .and(header("x-trace", "abc"))
        .and(body_json(json!({ "url": "https://img.example/rex.png" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "ok": true })))
        .mount(&mock_server)
        .await;

    let client = create_client(ClientOptions::new().with_base_url(format!("{}/api", mock_server.uri())))
        .try_with(openapi::<Untyped>())
        .expect("valid options");

    let response = client
        .invoke(
            "/pets/{id}/photos",
            RequestOptions::new()
                .method(Method::POST)
                .path_param("id", 42)
                .query("size", "small")
                .header("x-trace", "abc")
                .json(json!({ "url": "https://img.example/rex.png" })),
        )
        .await
        .expect("request succeeds");

    assert_eq!(response, json!({ "ok": true }));
}

#[tokio::test]
async fn default_options_apply_to_every_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pets"))
        .and(query_param("api-version", "2"))
        .and(header("authorization", "Bearer secret"))
        .and(header("x-client", "apiful"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }])))
        .expect(2)
        .mount(&mock_server)
        .await;

    let options = ClientOptions::new()
        .with_base_url(mock_server.uri())
        .with_header("x-client", "apiful")
        .with_query("api-version", 2)
        .with_authorization_token("secret");
    let client = create_client(options)
        .try_with(openapi::<Untyped>())
        .expect("valid options");

    for _ in 0..2 {
        let response = client
            .invoke("/pets", RequestOptions::new())
            .await
            .expect("request succeeds");
        assert_eq!(response, json!([{ "id": 1 }]));
    }
}

#[tokio::test]
async fn method_defaults_from_schema_operations() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/pets/7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_client(ClientOptions::new().with_base_url(mock_server.uri()))
        .try_with(openapi::<PetStore>())
        .expect("valid options");

    let response = client
        .invoke("/pets/{id}", RequestOptions::new().path_param("id", 7))
        .await
        .expect("request succeeds");
    assert!(response.is_null());
}

#[tokio::test]
async fn non_success_status_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pets/999"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&mock_server)
        .await;

    let client = create_client(ClientOptions::new().with_base_url(mock_server.uri()))
        .try_with(openapi::<Untyped>())
        .expect("valid options");

    let error = client
        .invoke("/pets/{id}", RequestOptions::new().path_param("id", 999))
        .await
        .expect_err("404 is an error");
    match error {
        ClientError::HttpStatus { status, body } => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(body, "not found");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn methods_survive_openapi_extension() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "up" })))
        .mount(&mock_server)
        .await;

    let client = create_client(ClientOptions::new().with_base_url(mock_server.uri()))
        .with(|_| MethodsExtension::new().method("greet", |_| Ok(json!("hi"))))
        .try_with(openapi::<Untyped>())
        .expect("valid options");

    assert_eq!(client.call("greet", &[]).expect("still callable"), json!("hi"));
    let response = client
        .invoke("/health", RequestOptions::new())
        .await
        .expect("request succeeds");
    assert_eq!(response, json!({ "status": "up" }));
}

#[tokio::test]
async fn standalone_client_resolves_paths() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/files/a%20b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "a b" })))
        .mount(&mock_server)
        .await;

    let service = create_openapi_client::<Untyped>(
        &ClientOptions::new().with_base_url(mock_server.uri()),
    )
    .expect("valid options");

    let response = service
        .call("/files/{name}", RequestOptions::new().path_param("name", "a b"))
        .await
        .expect("request succeeds");
    assert_eq!(response, json!({ "name": "a b" }));
}
