/// Dispatcher tests: protocol handling and tool routing against a recording backend
mod common;

use common::{dispatcher_with, query_json, request, tool_call, RecordingBackend};
use healthcare_mcp::backend::BackendError;
use healthcare_mcp::mcp::{JsonRpcResponse, Session};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

async fn send(frame: &str, backend: std::sync::Arc<RecordingBackend>) -> Option<JsonRpcResponse> {
    let dispatcher = dispatcher_with(backend);
    let mut session = Session::new();
    dispatcher.handle_frame(&mut session, frame).await
}

fn to_json(response: &JsonRpcResponse) -> Value {
    serde_json::to_value(response).unwrap()
}

#[tokio::test]
async fn test_initialize_returns_server_identity() {
    let backend = RecordingBackend::ok(json!({}));
    let frame = request(
        json!(1),
        "initialize",
        json!({"protocolVersion": "2024-11-05", "clientInfo": {"name": "inspector"}}),
    );

    let response = send(&frame, backend.clone()).await.unwrap();
    let value = to_json(&response);

    assert_eq!(value["id"], 1);
    assert_eq!(value["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(value["result"]["serverInfo"]["name"], "Healthcare MCP Server");
    assert_eq!(value["result"]["serverInfo"]["version"], "1.0.0");
    assert_eq!(value["result"]["capabilities"]["tools"]["listChanged"], true);
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_initialize_records_client_info() {
    let dispatcher = dispatcher_with(RecordingBackend::ok(json!({})));
    let mut session = Session::new();
    let frame = request(
        json!(1),
        "initialize",
        json!({"clientInfo": {"name": "inspector", "version": "0.1"}}),
    );

    dispatcher.handle_frame(&mut session, &frame).await.unwrap();

    assert_eq!(
        session.client_info(),
        Some(&json!({"name": "inspector", "version": "0.1"}))
    );
}

#[tokio::test]
async fn test_initialized_notification_gets_no_reply() {
    let dispatcher = dispatcher_with(RecordingBackend::ok(json!({})));
    let mut session = Session::new();

    let reply = dispatcher
        .handle_frame(
            &mut session,
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        )
        .await;

    assert!(reply.is_none());
    assert!(session.is_initialized());
}

#[tokio::test]
async fn test_initialized_with_id_still_gets_no_reply() {
    let backend = RecordingBackend::ok(json!({}));
    let frame = request(json!(9), "notifications/initialized", json!({}));

    assert!(send(&frame, backend).await.is_none());
}

#[tokio::test]
async fn test_tools_list_is_stable() {
    let dispatcher = dispatcher_with(RecordingBackend::ok(json!({})));
    let mut session = Session::new();

    let first = dispatcher
        .handle_frame(&mut session, &request(json!(1), "tools/list", json!({})))
        .await
        .unwrap();
    let second = dispatcher
        .handle_frame(&mut session, &request(json!(2), "tools/list", json!({})))
        .await
        .unwrap();

    let first = to_json(&first)["result"].clone();
    let second = to_json(&second)["result"].clone();
    assert_eq!(first, second);

    let names: Vec<&str> = first["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|tool| tool["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "fda_drug_lookup",
            "pubmed_search",
            "health_topics",
            "clinical_trials_search",
            "lookup_icd_code"
        ]
    );
}

#[tokio::test]
async fn test_tools_list_required_sets() {
    let backend = RecordingBackend::ok(json!({}));
    let response = send(&request(json!(1), "tools/list", json!({})), backend)
        .await
        .unwrap();
    let tools = to_json(&response)["result"]["tools"].clone();

    let required = |index: usize| tools[index]["inputSchema"]["required"].clone();
    assert_eq!(required(0), json!(["drug_name"]));
    assert_eq!(required(1), json!(["query"]));
    assert_eq!(required(2), json!(["topic"]));
    assert_eq!(required(3), json!(["condition"]));
    assert_eq!(required(4), json!([]));

    assert_eq!(
        tools[1]["inputSchema"]["properties"]["max_results"]["default"],
        5
    );
    assert_eq!(
        tools[3]["inputSchema"]["properties"]["status"]["default"],
        "recruiting"
    );
}

#[tokio::test]
async fn test_ping_returns_empty_object() {
    let backend = RecordingBackend::ok(json!({}));
    let response = send(&request(json!("p-1"), "ping", json!({})), backend)
        .await
        .unwrap();

    assert_eq!(
        to_json(&response),
        json!({"jsonrpc": "2.0", "id": "p-1", "result": {}})
    );
}

#[tokio::test]
async fn test_unknown_method() {
    let backend = RecordingBackend::ok(json!({}));
    let response = send(&request(json!(4), "resources/list", json!({})), backend)
        .await
        .unwrap();

    let error = response.as_error().unwrap();
    assert_eq!(error.code, -32601);
    assert!(error.message.contains("resources/list"));
    assert_eq!(response.id, json!(4));
}

#[tokio::test]
async fn test_unknown_method_notification_is_silent() {
    let backend = RecordingBackend::ok(json!({}));

    let reply = send(r#"{"jsonrpc":"2.0","method":"notifications/cancelled"}"#, backend).await;

    assert!(reply.is_none());
}

#[tokio::test]
async fn test_malformed_frame_is_parse_error_with_null_id() {
    let backend = RecordingBackend::ok(json!({}));
    let response = send("{\"jsonrpc\": \"2.0\", \"id\": 1, ", backend)
        .await
        .unwrap();

    assert_eq!(response.id, Value::Null);
    assert_eq!(response.as_error().unwrap().code, -32700);
}

#[tokio::test]
async fn test_wrong_jsonrpc_version_is_invalid_request() {
    let backend = RecordingBackend::ok(json!({}));
    let response = send(r#"{"jsonrpc":"1.0","id":5,"method":"ping"}"#, backend)
        .await
        .unwrap();

    assert_eq!(response.id, json!(5));
    assert_eq!(response.as_error().unwrap().code, -32600);
}

#[tokio::test]
async fn test_pubmed_search_end_to_end() {
    let payload = json!({"status": "success", "articles": [{"pmid": "1"}]});
    let backend = RecordingBackend::ok(payload.clone());
    let frame = r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"pubmed_search","arguments":{"query":"diabetes","max_results":3}}}"#;

    let response = send(frame, backend.clone()).await.unwrap();

    let calls = backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "/api/pubmed");
    assert_eq!(
        query_json(&calls[0].1),
        json!({"query": "diabetes", "max_results": 3, "date_range": ""})
    );

    let expected_text = serde_json::to_string_pretty(&payload).unwrap();
    assert_eq!(
        to_json(&response),
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {"content": [{"type": "text", "text": expected_text}]}
        })
    );
}

#[tokio::test]
async fn test_each_tool_routes_to_its_path() {
    let cases = [
        ("fda_drug_lookup", json!({"drug_name": "aspirin"}), "/api/fda"),
        ("pubmed_search", json!({"query": "asthma"}), "/api/pubmed"),
        ("health_topics", json!({"topic": "nutrition"}), "/api/health_finder"),
        (
            "clinical_trials_search",
            json!({"condition": "asthma"}),
            "/api/clinical_trials",
        ),
        ("lookup_icd_code", json!({"code": "E11"}), "/api/medical_terminology"),
    ];

    for (name, arguments, path) in cases {
        let backend = RecordingBackend::ok(json!({"ok": true}));
        let response = send(&tool_call(1, name, arguments), backend.clone())
            .await
            .unwrap();

        assert!(response.as_result().is_some(), "{} should succeed", name);
        let calls = backend.calls();
        assert_eq!(calls.len(), 1, "{} should call the backend once", name);
        assert_eq!(calls[0].0, path);
    }
}

#[tokio::test]
async fn test_defaults_are_applied() {
    let backend = RecordingBackend::ok(json!({}));
    send(
        &tool_call(1, "clinical_trials_search", json!({"condition": "asthma"})),
        backend.clone(),
    )
    .await
    .unwrap();

    assert_eq!(
        query_json(&backend.calls()[0].1),
        json!({"condition": "asthma", "status": "recruiting", "max_results": 10})
    );

    let backend = RecordingBackend::ok(json!({}));
    send(
        &tool_call(2, "fda_drug_lookup", json!({"drug_name": "aspirin", "search_type": ""})),
        backend.clone(),
    )
    .await
    .unwrap();

    assert_eq!(
        query_json(&backend.calls()[0].1),
        json!({"drug_name": "aspirin", "search_type": "general"})
    );
}

#[tokio::test]
async fn test_missing_required_argument() {
    let backend = RecordingBackend::ok(json!({}));
    let response = send(
        &tool_call(3, "fda_drug_lookup", json!({"search_type": "label"})),
        backend.clone(),
    )
    .await
    .unwrap();

    let error = response.as_error().unwrap();
    assert_eq!(error.code, -32601);
    assert_eq!(error.message, "Missing required argument: drug_name");
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_blank_required_argument_counts_as_missing() {
    let backend = RecordingBackend::ok(json!({}));
    let response = send(&tool_call(3, "health_topics", json!({"topic": ""})), backend.clone())
        .await
        .unwrap();

    assert_eq!(
        response.as_error().unwrap().message,
        "Missing required argument: topic"
    );
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_tool() {
    let backend = RecordingBackend::ok(json!({}));
    let response = send(&tool_call(6, "weather_lookup", json!({})), backend.clone())
        .await
        .unwrap();

    let error = response.as_error().unwrap();
    assert_eq!(error.code, -32601);
    assert!(error.message.contains("weather_lookup"));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_icd_lookup_requires_code_or_description() {
    let backend = RecordingBackend::ok(json!({}));
    let response = send(
        &tool_call(7, "lookup_icd_code", json!({"max_results": 5})),
        backend.clone(),
    )
    .await
    .unwrap();

    let result = response.as_result().unwrap();
    assert_eq!(result["isError"], true);
    let text = result["content"][0]["text"].as_str().unwrap();
    let payload: Value = serde_json::from_str(text).unwrap();
    assert!(payload["error"].as_str().unwrap().contains("code or description"));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_icd_lookup_omits_absent_optionals() {
    let backend = RecordingBackend::ok(json!({}));
    send(
        &tool_call(8, "lookup_icd_code", json!({"description": "diabetes", "code": ""})),
        backend.clone(),
    )
    .await
    .unwrap();

    assert_eq!(
        query_json(&backend.calls()[0].1),
        json!({"description": "diabetes", "max_results": 10})
    );
}

#[tokio::test]
async fn test_integer_strings_are_coerced() {
    let backend = RecordingBackend::ok(json!({}));
    send(
        &tool_call(9, "pubmed_search", json!({"query": "flu", "max_results": "7"})),
        backend.clone(),
    )
    .await
    .unwrap();

    assert_eq!(backend.calls()[0].1["max_results"], json!(7));
}

#[tokio::test]
async fn test_wrong_argument_type_is_tool_error() {
    let backend = RecordingBackend::ok(json!({}));
    let response = send(
        &tool_call(10, "pubmed_search", json!({"query": "flu", "max_results": "many"})),
        backend.clone(),
    )
    .await
    .unwrap();

    assert_eq!(response.as_result().unwrap()["isError"], true);
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_arguments_must_be_object() {
    let backend = RecordingBackend::ok(json!({}));
    let response = send(&tool_call(11, "pubmed_search", json!(["flu"])), backend)
        .await
        .unwrap();

    assert_eq!(response.as_error().unwrap().code, -32602);
}

#[tokio::test]
async fn test_tools_call_without_params() {
    let backend = RecordingBackend::ok(json!({}));
    let response = send(r#"{"jsonrpc":"2.0","id":12,"method":"tools/call"}"#, backend)
        .await
        .unwrap();

    assert_eq!(response.as_error().unwrap().code, -32602);
}

#[tokio::test]
async fn test_backend_timeout_is_internal_error() {
    let backend = RecordingBackend::failing(BackendError::Timeout);
    let response = send(&tool_call(13, "pubmed_search", json!({"query": "flu"})), backend)
        .await
        .unwrap();

    let error = response.as_error().unwrap();
    assert_eq!(error.code, -32603);
    assert_eq!(error.message, "Backend service timeout");
    assert_eq!(response.id, json!(13));
}

#[tokio::test]
async fn test_backend_status_error_carries_body() {
    let backend = RecordingBackend::failing(BackendError::Status {
        status: 503,
        body: "maintenance".into(),
    });
    let response = send(&tool_call(14, "health_topics", json!({"topic": "sleep"})), backend)
        .await
        .unwrap();

    let error = response.as_error().unwrap();
    assert_eq!(error.code, -32603);
    assert_eq!(error.message, "HTTP 503: maintenance");
}

#[tokio::test]
async fn test_null_id_is_answered() {
    let backend = RecordingBackend::ok(json!({}));
    let response = send(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#, backend)
        .await
        .unwrap();

    assert_eq!(response.id, Value::Null);
    assert_eq!(response.as_result(), Some(&json!({})));
}

#[tokio::test]
async fn test_enumerated_arguments_reject_unknown_values() {
    let cases = [
        ("fda_drug_lookup", json!({"drug_name": "aspirin", "search_type": "bogus"})),
        ("health_topics", json!({"topic": "sleep", "language": "klingon"})),
    ];

    for (name, arguments) in cases {
        let backend = RecordingBackend::ok(json!({}));
        let response = send(&tool_call(15, name, arguments), backend.clone())
            .await
            .unwrap();

        let result = response.as_result().unwrap();
        assert_eq!(result["isError"], true, "{} should be rejected", name);
        let text = result["content"][0]["text"].as_str().unwrap();
        let payload: Value = serde_json::from_str(text).unwrap();
        assert!(payload["error"].as_str().unwrap().contains("must be one of"));
        assert!(backend.calls().is_empty(), "{} must not reach the backend", name);
    }
}

#[tokio::test]
async fn test_enumerated_arguments_accept_listed_values() {
    let backend = RecordingBackend::ok(json!({}));
    send(
        &tool_call(16, "fda_drug_lookup", json!({"drug_name": "aspirin", "search_type": "adverse_events"})),
        backend.clone(),
    )
    .await
    .unwrap();

    assert_eq!(backend.calls()[0].1["search_type"], json!("adverse_events"));
}

#[tokio::test]
async fn test_enumerated_values_do_not_change_the_listing() {
    let backend = RecordingBackend::ok(json!({}));
    let response = send(&request(json!(17), "tools/list", json!({})), backend)
        .await
        .unwrap();
    let tools = to_json(&response)["result"]["tools"].clone();

    assert_eq!(
        tools[0]["inputSchema"]["properties"]["search_type"],
        json!({
            "type": "string",
            "description": "Type of search (general, label, adverse_events)",
            "default": "general"
        })
    );
}
