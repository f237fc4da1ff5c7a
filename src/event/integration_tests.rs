// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! End-to-end dispatch scenarios over the full core: auth, strategy
//! resolution, registry lookup, real wasmtime guests, and the async broker
//! round trip.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::backends::stub::StubInstance;
use crate::backends::wasm::WasmtimeRuntime;
use crate::broker::{
    ApiBroker, ApiServer, BrokerWorker, HttpRequest, HttpResponse, MemoryTaskQueue, Router,
    EVENT_TYPE_HEADER,
};
use crate::event::{issue_token, Event, EventDispatcher, EventHeader, EVENT_TYPE_ANY};
use crate::model::{
    MemoryProjectStore, MemoryPublisherStore, ProjectView, PublisherView,
};
use crate::services::{HostContext, KvStore, MemoryKvStore};
use crate::strategy::{InstanceHandler, StrategyResolver, StrategyStore};
use crate::traits::{HandleOutcome, WasmInstance, WasmRuntime};
use crate::vm::InstanceRegistry;

const PRELUDE: &str = r#"
    (memory (export "memory") 1)
    (global $brk (mut i32) (i32.const 1024))
    (func (export "alloc") (param $size i32) (result i32)
        (local $ptr i32)
        (local.set $ptr (global.get $brk))
        (global.set $brk (i32.add (global.get $brk) (local.get $size)))
        (local.get $ptr))
"#;

struct Gateway {
    project: ProjectView,
    strategies: Arc<StrategyStore>,
    registry: Arc<InstanceRegistry>,
    dispatcher: Arc<EventDispatcher>,
}

fn gateway() -> Gateway {
    let project = ProjectView {
        project_id: 10,
        name: "proj".to_string(),
        issuer: "wasmgate".to_string(),
        exp_in: 3600,
        sign_key: "test-sign-key".to_string(),
        database: None,
    };

    let projects = Arc::new(MemoryProjectStore::new());
    projects.insert(project.clone());

    let publishers = Arc::new(MemoryPublisherStore::new());
    publishers.insert(
        "proj",
        PublisherView {
            publisher_id: 1,
            project_id: 10,
            pub_key: "pubA".to_string(),
            name: "sensor-a".to_string(),
        },
    );

    let strategies = Arc::new(StrategyStore::new());
    let registry = Arc::new(InstanceRegistry::new());
    let dispatcher = Arc::new(EventDispatcher::new(
        projects,
        publishers,
        Arc::new(StrategyResolver::new(strategies.clone())),
        registry.clone(),
    ));

    Gateway {
        project,
        strategies,
        registry,
        dispatcher,
    }
}

fn event(project: &ProjectView, event_type: u32, payload: &str, pub_id: &str) -> Event {
    Event {
        header: EventHeader {
            event_type,
            pub_id: pub_id.to_string(),
            pub_time: 1_690_000_000,
            token: issue_token(project),
            event_id: String::new(),
        },
        payload: payload.to_string(),
    }
}

fn route(gateway: &Gateway, event_type: u32, instance_id: u64, handler: &str) {
    gateway.strategies.add(InstanceHandler {
        project_name: "proj".to_string(),
        applet_id: 1,
        applet_name: "applet".to_string(),
        instance_id,
        handler: handler.to_string(),
        event_type,
    });
}

fn wasm_instance(wat: &str, ctx: HostContext) -> Arc<dyn WasmInstance> {
    let runtime = WasmtimeRuntime::new(1_000_000).unwrap();
    let instance = runtime
        .instantiate(&wat::parse_str(wat).unwrap(), ctx)
        .unwrap();
    instance.start().unwrap();
    instance
}

/// Reads the event payload and stores it in the project KV under "k".
fn kv_writer_guest(handler: &str) -> String {
    format!(
        r#"(module
            (import "env" "ws_get_data" (func $get_data (param i32 i32 i32) (result i32)))
            (import "env" "ws_set_db" (func $set_db (param i32 i32 i32 i32) (result i32)))
            {PRELUDE}
            (data (i32.const 0) "k")
            (func (export "{handler}") (param $rid i32) (result i32)
                (local $status i32)
                (local.set $status
                    (call $get_data (local.get $rid) (i32.const 512) (i32.const 516)))
                (if (i32.ne (local.get $status) (i32.const 0))
                    (then (return (local.get $status))))
                (call $set_db (i32.const 0) (i32.const 1)
                    (i32.load (i32.const 512)) (i32.load (i32.const 516)))))"#
    )
}

/// Copies KV "k" to KV "copied".
fn kv_reader_guest(handler: &str) -> String {
    format!(
        r#"(module
            (import "env" "ws_get_db" (func $get_db (param i32 i32 i32 i32) (result i32)))
            (import "env" "ws_set_db" (func $set_db (param i32 i32 i32 i32) (result i32)))
            {PRELUDE}
            (data (i32.const 0) "k")
            (data (i32.const 8) "copied")
            (func (export "{handler}") (param $rid i32) (result i32)
                (local $status i32)
                (local.set $status
                    (call $get_db (i32.const 0) (i32.const 1) (i32.const 512) (i32.const 516)))
                (if (i32.ne (local.get $status) (i32.const 0))
                    (then (return (local.get $status))))
                (call $set_db (i32.const 8) (i32.const 6)
                    (i32.load (i32.const 512)) (i32.load (i32.const 516)))))"#
    )
}

// S1: one ANY strategy; the guest observes the payload through get_data(0).
#[tokio::test]
async fn match_any_strategy_delivers_payload() {
    let gw = gateway();
    let kv = Arc::new(MemoryKvStore::new());
    let mut ctx = HostContext::for_tests("proj");
    ctx.kv = kv.clone();

    let instance = wasm_instance(&kv_writer_guest("start"), ctx);
    let id = gw.registry.add(instance);
    route(&gw, EVENT_TYPE_ANY, id, "start");

    let result = gw
        .dispatcher
        .on_event("proj", &event(&gw.project, EVENT_TYPE_ANY, "hi", "pubA"))
        .await;

    assert!(result.err_msg.is_none(), "{:?}", result.err_msg);
    assert_eq!(result.pub_name.as_deref(), Some("sensor-a"));
    assert_eq!(result.wasm_results.len(), 1);
    assert_eq!(result.wasm_results[0].instance_id, id.to_string());
    assert_eq!(result.wasm_results[0].code, 0);
    assert_eq!(kv.get("k"), Some(b"hi".to_vec()));
}

// S2: only a type-7 strategy exists; a type-9 event matches nothing.
#[tokio::test]
async fn unmatched_event_type_is_not_an_error() {
    let gw = gateway();
    let stub = Arc::new(StubInstance::started());
    let id = gw.registry.add(stub.clone());
    route(&gw, 7, id, "on_seven");

    let result = gw
        .dispatcher
        .on_event("proj", &event(&gw.project, 9, "x", "pubA"))
        .await;

    assert!(result.err_msg.is_none());
    assert!(result.wasm_results.is_empty());
    assert!(stub.calls().is_empty());
}

// S3: a token minted for a different project is rejected before any handler.
#[tokio::test]
async fn foreign_project_token_is_rejected() {
    let gw = gateway();
    let stub = Arc::new(StubInstance::started());
    let id = gw.registry.add(stub.clone());
    route(&gw, EVENT_TYPE_ANY, id, "start");

    let stranger = ProjectView {
        project_id: 99,
        ..gw.project.clone()
    };
    let mut evt = event(&gw.project, EVENT_TYPE_ANY, "x", "");
    evt.header.token = issue_token(&stranger);

    let result = gw.dispatcher.on_event("proj", &evt).await;

    assert_eq!(result.err_msg.as_deref(), Some("no project permission"));
    assert!(result.wasm_results.is_empty());
    assert!(stub.calls().is_empty());
}

// S4: one matched instance is gone, the other runs; partial failure is
// normal and the result covers every matched strategy.
#[tokio::test]
async fn partial_failure_keeps_siblings() {
    let gw = gateway();

    let gone = Arc::new(StubInstance::started());
    let gone_id = gw.registry.add(gone);
    gw.registry.remove(gone_id);
    route(&gw, EVENT_TYPE_ANY, gone_id, "start");

    let live = Arc::new(StubInstance::started().with_outcome(HandleOutcome::ok(5)));
    let live_id = gw.registry.add(live);
    route(&gw, EVENT_TYPE_ANY, live_id, "start");

    let result = gw
        .dispatcher
        .on_event("proj", &event(&gw.project, EVENT_TYPE_ANY, "x", ""))
        .await;

    assert_eq!(result.wasm_results.len(), 2);
    let missing = result
        .wasm_results
        .iter()
        .find(|r| r.instance_id == gone_id.to_string())
        .unwrap();
    assert_eq!(missing.code, -1);
    assert_eq!(missing.err_msg.as_deref(), Some("instance not found"));

    let ran = result
        .wasm_results
        .iter()
        .find(|r| r.instance_id == live_id.to_string())
        .unwrap();
    assert_eq!(ran.code, 5);
}

// S5: KV written by one event's handler is visible to a later event's
// handler on the same project.
#[tokio::test]
async fn kv_round_trips_across_events() {
    let gw = gateway();
    let kv = Arc::new(MemoryKvStore::new());

    let mut writer_ctx = HostContext::for_tests("proj");
    writer_ctx.kv = kv.clone();
    let writer = wasm_instance(&kv_writer_guest("start"), writer_ctx);
    let writer_id = gw.registry.add(writer);
    route(&gw, 1, writer_id, "start");

    let mut reader_ctx = HostContext::for_tests("proj");
    reader_ctx.kv = kv.clone();
    let reader = wasm_instance(&kv_reader_guest("read"), reader_ctx);
    let reader_id = gw.registry.add(reader);
    route(&gw, 2, reader_id, "read");

    let first = gw
        .dispatcher
        .on_event("proj", &event(&gw.project, 1, "v", ""))
        .await;
    assert_eq!(first.wasm_results[0].code, 0, "{:?}", first.wasm_results);

    let second = gw
        .dispatcher
        .on_event("proj", &event(&gw.project, 2, "", ""))
        .await;
    assert_eq!(second.wasm_results[0].code, 0, "{:?}", second.wasm_results);

    assert_eq!(kv.get("copied"), Some(b"v".to_vec()));
}

// S6: an async api_call produces exactly one synthetic event of the type
// named in the eventType header, carrying the response envelope.
#[tokio::test]
async fn async_api_call_round_trips_as_event() {
    let gw = gateway();

    let stub = Arc::new(StubInstance::started());
    let id = gw.registry.add(stub.clone());
    route(&gw, 901, id, "on_response");

    let queue = Arc::new(MemoryTaskQueue::new());
    let router = Arc::new(Router::new());
    router.mount("/echo", |req| HttpResponse::ok(req.body.clone()));
    let broker = ApiBroker::new(queue.clone(), router.clone());

    let cancel = CancellationToken::new();
    let worker = Arc::new(BrokerWorker::new(
        queue,
        router,
        gw.dispatcher.clone(),
        5,
        cancel.clone(),
    ));
    let handle = worker.spawn();

    let envelope = serde_json::to_vec(&HttpRequest {
        method: "POST".to_string(),
        url: "http://api.internal/echo".to_string(),
        header: std::collections::HashMap::from([(
            EVENT_TYPE_HEADER.to_string(),
            vec!["901".to_string()],
        )]),
        body: b"ping".to_vec(),
        asynchronous: true,
    })
    .unwrap();

    let ack = broker.call("proj", &envelope);
    assert_eq!(ack.status_code, 202);

    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
    loop {
        let calls = stub.calls();
        if !calls.is_empty() {
            assert_eq!(calls.len(), 1);
            assert_eq!(calls[0].handler, "on_response");
            assert_eq!(calls[0].event_type, 901);
            let response: HttpResponse = serde_json::from_slice(&calls[0].payload).unwrap();
            assert_eq!(response.status_code, 200);
            assert_eq!(response.body, b"ping");
            break;
        }
        assert!(
            std::time::Instant::now() < deadline,
            "no synthetic event arrived"
        );
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    cancel.cancel();
    let _ = handle.await;
}

// Unknown publishers are surfaced with no handler invocations.
#[tokio::test]
async fn unknown_publisher_is_surfaced() {
    let gw = gateway();
    let stub = Arc::new(StubInstance::started());
    let id = gw.registry.add(stub.clone());
    route(&gw, EVENT_TYPE_ANY, id, "start");

    let result = gw
        .dispatcher
        .on_event("proj", &event(&gw.project, EVENT_TYPE_ANY, "x", "ghost"))
        .await;

    assert!(result.err_msg.unwrap().contains("ghost"));
    assert!(stub.calls().is_empty());
}

// An empty token never reaches strategy resolution.
#[tokio::test]
async fn missing_token_is_rejected() {
    let gw = gateway();
    let mut evt = event(&gw.project, EVENT_TYPE_ANY, "x", "");
    evt.header.token = String::new();

    let result = gw.dispatcher.on_event("proj", &evt).await;
    assert_eq!(result.err_msg.as_deref(), Some("message token is invalid"));
}

// Dispatching on an unknown project reports the failure in the result.
#[tokio::test]
async fn unknown_project_is_surfaced() {
    let gw = gateway();
    let result = gw
        .dispatcher
        .on_event("nope", &event(&gw.project, EVENT_TYPE_ANY, "x", ""))
        .await;
    assert!(result.err_msg.unwrap().contains("nope"));
}
