//! End-to-end tests: the full actix app mounted in-process, plus a loopback
//! stub upstream for the chat paths. The stub serves different content on
//! /chat/completions and /responses, so assertions on the normalized result
//! also prove which upstream shape served the call.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use actix_web::{App, HttpResponse, HttpServer, test, web};
use serde_json::{Value, json};

use mcp_router::Gateway;
use mcp_router::core::config::Settings;
use mcp_router::core::server::routes;

fn settings(base_url: &str) -> Settings {
    Settings {
        api_key: "sk-test-0123456789abcdef".to_string(),
        base_url: base_url.to_string(),
        default_model: "gpt-4.1-mini".to_string(),
        app_public_url: None,
        app_title: "mcp-router".to_string(),
        include_reasoning: None,
        files_base_dir: std::path::PathBuf::from("/app"),
        host: "127.0.0.1".to_string(),
        port: 0,
        transport: "http".to_string(),
    }
}

fn app_data(base_url: &str) -> (web::Data<Gateway>, web::Data<AtomicU64>) {
    let gateway = Arc::new(Gateway::new(settings(base_url)));
    (web::Data::from(gateway), web::Data::new(AtomicU64::new(0)))
}

/// Start a stub upstream on a loopback port and return its base URL.
fn spawn_stub_upstream() -> String {
    async fn completions() -> HttpResponse {
        HttpResponse::Ok().json(json!({
            "id": "cmpl-stub",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "stub-model",
            "choices": [{
                "message": {"role": "assistant", "content": "hello"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 1, "completion_tokens": 1, "total_tokens": 2}
        }))
    }

    async fn responses() -> HttpResponse {
        HttpResponse::Ok().json(json!({
            "id": "resp-stub",
            "output": [{
                "type": "message",
                "content": [{"type": "output_text", "text": "searched"}]
            }]
        }))
    }

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let server = HttpServer::new(|| {
        App::new()
            .route("/chat/completions", web::post().to(completions))
            .route("/responses", web::post().to(responses))
    })
    .listen(listener)
    .unwrap()
    .workers(1)
    .run();
    actix_web::rt::spawn(server);

    base_url
}

#[actix_rt::test]
async fn handshake_reports_ready() {
    let (gateway, counter) = app_data("http://127.0.0.1:1");
    let app =
        test::init_service(App::new().app_data(gateway).app_data(counter).configure(routes)).await;

    let req = test::TestRequest::get().uri("/mcp").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(
        body,
        json!({"mcp": true, "transport": "http", "endpoint": "/mcp", "status": "ready"})
    );
}

#[actix_rt::test]
async fn echo_round_trip() {
    let (gateway, counter) = app_data("http://127.0.0.1:1");
    let app =
        test::init_service(App::new().app_data(gateway).app_data(counter).configure(routes)).await;

    let req = test::TestRequest::post()
        .uri("/mcp")
        .set_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": {"name": "echo", "arguments": {"text": 123}}
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["id"], json!(1));
    assert_eq!(body["result"], json!({"text": "123"}));
}

#[actix_rt::test]
async fn unknown_method_is_rpc_error_with_http_200() {
    let (gateway, counter) = app_data("http://127.0.0.1:1");
    let app =
        test::init_service(App::new().app_data(gateway).app_data(counter).configure(routes)).await;

    let req = test::TestRequest::post()
        .uri("/mcp")
        .set_json(json!({"jsonrpc": "2.0", "id": 9, "method": "foo/bar"}))
        .to_request();
    let response = test::call_service(&app, req).await;
    assert!(response.status().is_success());

    let body: Value = test::read_body_json(response).await;
    assert_eq!(
        body,
        json!({
            "jsonrpc": "2.0",
            "id": 9,
            "error": {
                "code": -32601,
                "message": "Method not found",
                "data": {"method": "foo/bar"}
            }
        })
    );
}

#[actix_rt::test]
async fn unknown_tool_lists_available_names() {
    let (gateway, counter) = app_data("http://127.0.0.1:1");
    let app =
        test::init_service(App::new().app_data(gateway).app_data(counter).configure(routes)).await;

    let req = test::TestRequest::post()
        .uri("/mcp")
        .set_json(json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "tools/call",
            "params": {"name": "nope", "arguments": {}}
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["error"]["code"], json!(-32601));
    assert_eq!(
        body["error"]["data"]["available"],
        json!(["echo", "read_file", "chat"])
    );
}

#[actix_rt::test]
async fn read_file_traversal_is_contained() {
    let (gateway, counter) = app_data("http://127.0.0.1:1");
    let app =
        test::init_service(App::new().app_data(gateway).app_data(counter).configure(routes)).await;

    let req = test::TestRequest::post()
        .uri("/mcp")
        .set_json(json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": {"name": "read_file", "arguments": {"path": "../../etc/passwd"}}
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let result = &body["result"];
    assert_eq!(result["size"], json!(0));
    assert!(!result["error"].as_str().unwrap().is_empty());
}

#[actix_rt::test]
async fn chat_plain_path_normalizes_completion() {
    let base_url = spawn_stub_upstream();
    let (gateway, counter) = app_data(&base_url);
    let app =
        test::init_service(App::new().app_data(gateway).app_data(counter).configure(routes)).await;

    let req = test::TestRequest::post()
        .uri("/mcp")
        .set_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": {
                "name": "chat",
                "arguments": {
                    "model": "m",
                    "messages": [{"role": "user", "content": "hi"}]
                }
            }
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["jsonrpc"], json!("2.0"));
    assert_eq!(body["id"], json!(1));
    let result = &body["result"];
    // Content "hello" is only served by the stub's /chat/completions route.
    assert_eq!(result["message"], json!({"role": "assistant", "content": "hello"}));
    assert_eq!(result["model"], json!("stub-model"));
    assert_eq!(result["finish_reason"], json!("stop"));
    assert_eq!(result["created"], json!(1_700_000_000));
    assert_eq!(result["usage"]["total_tokens"], json!(2));
}

#[actix_rt::test]
async fn chat_hosted_tools_take_responses_path() {
    let base_url = spawn_stub_upstream();
    let (gateway, counter) = app_data(&base_url);
    let app =
        test::init_service(App::new().app_data(gateway).app_data(counter).configure(routes)).await;

    let req = test::TestRequest::post()
        .uri("/mcp")
        .set_json(json!({
            "jsonrpc": "2.0",
            "id": 4,
            "method": "tools/call",
            "params": {
                "name": "chat",
                "arguments": {
                    "messages": [{"role": "user", "content": "look this up"}],
                    "tools": [{"type": "web_search"}]
                }
            }
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let result = &body["result"];
    // Content "searched" is only served by the stub's /responses route.
    assert_eq!(result["message"]["content"], json!("searched"));
    assert_eq!(result["object"], json!("response"));
    assert_eq!(result["created"], json!(null));
    assert_eq!(result["usage"], json!(null));
    assert_eq!(result["id"], json!("resp-stub"));
}

#[actix_rt::test]
async fn chat_upstream_failure_is_router_call_failed() {
    // Nothing listens on this port: the upstream call fails at connect.
    let (gateway, counter) = app_data("http://127.0.0.1:1");
    let app =
        test::init_service(App::new().app_data(gateway).app_data(counter).configure(routes)).await;

    let req = test::TestRequest::post()
        .uri("/mcp")
        .set_json(json!({
            "jsonrpc": "2.0",
            "id": 5,
            "method": "tools/call",
            "params": {"name": "chat", "arguments": {"messages": []}}
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["error"]["code"], json!(-32000));
    assert_eq!(body["error"]["message"], json!("Router call failed"));
    assert!(!body["error"]["data"].as_str().unwrap().is_empty());
}

#[actix_rt::test]
async fn health_and_diagnostics_report_the_gateway() {
    let (gateway, counter) = app_data("http://127.0.0.1:1");
    let app =
        test::init_service(App::new().app_data(gateway).app_data(counter).configure(routes)).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], json!("ok"));

    let req = test::TestRequest::get().uri("/diagnostics").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["tools"]["count"], json!(3));
    assert_eq!(body["tools"]["names"], json!(["echo", "read_file", "chat"]));
    assert_eq!(body["upstream"]["client_ready"], json!(true));
    assert_eq!(body["upstream"]["api_key_set"], json!(true));
}

#[actix_rt::test]
async fn metrics_count_rpc_requests() {
    let (gateway, counter) = app_data("http://127.0.0.1:1");
    let app =
        test::init_service(App::new().app_data(gateway).app_data(counter).configure(routes)).await;

    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/mcp")
            .set_json(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}))
            .to_request();
        let _: Value = test::call_and_read_body_json(&app, req).await;
    }

    let req = test::TestRequest::get().uri("/metrics").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["requests_total"], json!(2));
}
