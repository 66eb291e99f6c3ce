// End-to-end tests: BlingNode over the reqwest transport against a mock Bling API

use bling_connector::transport::StaticToken;
use bling_connector::{BatchPolicy, BlingNode, Invocation, OAuth2HttpTransport, Operation, Resource};
use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn node_for(server: &Server) -> BlingNode {
    let transport =
        OAuth2HttpTransport::new(Arc::new(StaticToken("test_token".to_string())), Duration::from_secs(5))
            .unwrap();
    BlingNode::new(Arc::new(transport)).with_base_url(format!("{}/Api/v3", server.url()))
}

#[tokio::test]
async fn test_get_all_contacts() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/Api/v3/contatos")
        .match_query(Matcher::UrlEncoded("limite".into(), "50".into()))
        .match_header("authorization", "Bearer test_token")
        .match_header("accept", "application/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"id": 1, "nome": "Ana"}, {"id": 2, "nome": "Bruno"}]"#)
        .create_async()
        .await;

    let records = node_for(&server)
        .execute(Resource::Contact, Operation::GetAll, &[json!({})], &BatchPolicy::default())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].json["nome"], "Bruno");
}

#[tokio::test]
async fn test_create_product_sends_json_body() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/Api/v3/produtos")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({"nome": "Caderno", "codigo": "CAD-1", "preco": 12.5, "situacao": "A"})))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"data": {"id": 777}}"#)
        .create_async()
        .await;

    let item = json!({
        "productData": {"nome": "Caderno", "codigo": "CAD-1", "preco": 12.5, "situacao": "A"}
    });
    let records = node_for(&server)
        .execute(Resource::Product, Operation::Create, &[item], &BatchPolicy::default())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].json["data"]["id"], 777);
}

#[tokio::test]
async fn test_delete_with_empty_body_yields_nothing() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("DELETE", "/Api/v3/contatos/42")
        .with_status(204)
        .create_async()
        .await;

    let records = node_for(&server)
        .execute(Resource::Contact, Operation::Delete, &[json!({"contactId": "42"})], &BatchPolicy::default())
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_payable_accounts_query_string() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/Api/v3/contas/pagar")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("limite".into(), "20".into()),
            Matcher::UrlEncoded("dataVencimentoFinal".into(), "2024-03-15".into()),
            Matcher::UrlEncoded("situacao".into(), "1".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"data": []}"#)
        .create_async()
        .await;

    let invocation: Invocation = serde_json::from_value(json!({
        "resource": "contas-pagar",
        "operation": "getAll",
        "items": [{"limit": 20, "dataVencimentoFinal": "2024-03-15T10:00:00Z"}]
    }))
    .unwrap();

    let records = node_for(&server)
        .run(invocation, BatchPolicy::default())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].json, json!({"data": []}));
}

#[tokio::test]
async fn test_http_errors_become_error_records() {
    let mut server = Server::new_async().await;
    let _not_found = server
        .mock("GET", "/Api/v3/produtos/1")
        .with_status(404)
        .with_body(r#"{"error": {"type": "RESOURCE_NOT_FOUND"}}"#)
        .create_async()
        .await;
    let _unauthorized = server
        .mock("GET", "/Api/v3/produtos/2")
        .with_status(401)
        .create_async()
        .await;
    let _ok = server
        .mock("GET", "/Api/v3/produtos/3")
        .with_status(200)
        .with_body(r#"{"data": {"id": 3}}"#)
        .create_async()
        .await;

    let items = vec![json!({"productId": "1"}), json!({"productId": "2"}), json!({"productId": "3"})];
    let records = node_for(&server)
        .execute(Resource::Product, Operation::Get, &items, &BatchPolicy::continue_on_fail())
        .await
        .unwrap();

    assert_eq!(records.len(), 3);
    let first = records[0].error.as_deref().unwrap();
    assert!(first.contains("404"));
    assert!(first.contains("RESOURCE_NOT_FOUND"));
    assert!(records[1].error.as_deref().unwrap().contains("token expired or invalid"));
    assert_eq!(records[2].json["data"]["id"], 3);
}

#[tokio::test]
async fn test_http_error_aborts_without_continue_on_fail() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/Api/v3/produtos")
        .match_query(Matcher::Any)
        .with_status(429)
        .create_async()
        .await;

    let err = node_for(&server)
        .execute(Resource::Product, Operation::GetAll, &[json!({})], &BatchPolicy::default())
        .await
        .unwrap_err();

    assert_eq!(err.item_index, 0);
    assert!(err.to_string().contains("rate limit"));
}
