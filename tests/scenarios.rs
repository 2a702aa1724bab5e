//! End-to-end scenarios against an in-memory engine.
//!
//! Every test plays the engine side through [`MemoryRemote`]: commands
//! written by the session are read with `next_command` and answered by hand.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use inspector_harness::{
    DomainProxy, Error, HarnessConfig, InterceptionController, MemoryRemote, MemoryTargets,
    PageSession, ProtocolSession, RequestPattern, ResolutionState, TargetInfo, TestRunner,
    TransportChannel,
};
use proptest::prelude::*;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio_test::{assert_pending, assert_ready_ok, task};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Test Helpers
// ============================================================================

/// Routes `tracing` output to the test writer; filter with `RUST_LOG`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn page() -> (PageSession, MemoryRemote) {
    init_tracing();
    let (channel, remote) = TransportChannel::memory();
    let dp = DomainProxy::new(ProtocolSession::new(channel));
    (PageSession::new(dp), remote)
}

/// Answers `Runtime.evaluate` with the number of the expression's length
/// and acknowledges everything else, until the session closes.
async fn serve(mut remote: MemoryRemote) {
    while let Some(command) = remote.next_command().await {
        match command.method.as_str() {
            "Runtime.evaluate" => {
                let expression = command.params["expression"].as_str().unwrap_or_default();
                remote.respond(
                    command.id,
                    json!({ "result": { "type": "number", "value": expression.len() } }),
                );
            }
            _ => remote.respond(command.id, json!({})),
        }
    }
}

fn spawn_servers(mut announced: mpsc::UnboundedReceiver<(TargetInfo, MemoryRemote)>) {
    tokio::spawn(async move {
        while let Some((_info, remote)) = announced.recv().await {
            tokio::spawn(serve(remote));
        }
    });
}

fn memory_runner(config: HarnessConfig) -> (TestRunner, Arc<MemoryTargets>, mpsc::UnboundedReceiver<(TargetInfo, MemoryRemote)>) {
    init_tracing();
    let (targets, announced) = MemoryTargets::new();
    let targets = Arc::new(targets);
    let runner = TestRunner::with_provider(config, targets.clone());
    (runner, targets, announced)
}

// ============================================================================
// Page Scenarios
// ============================================================================

#[tokio::test]
async fn test_evaluate_simple_expression() {
    let (page, mut remote) = page();

    let evaluating = tokio::spawn({
        let page = page.clone();
        async move { page.evaluate("1+1").await }
    });

    let command = remote.next_command().await.expect("evaluate");
    assert_eq!(command.method, "Runtime.evaluate");
    assert_eq!(command.params["expression"], "1+1");
    assert_eq!(command.params["returnByValue"], true);
    remote.respond(command.id, json!({ "result": { "type": "number", "value": 2 } }));

    let value = evaluating.await.expect("join").expect("evaluated");
    assert_eq!(value, json!(2));
}

#[tokio::test]
async fn test_evaluate_async_resolves_pending_promise() {
    let (page, mut remote) = page();

    let evaluating = tokio::spawn({
        let page = page.clone();
        async move {
            page.evaluate_async("new Promise(r => setTimeout(() => r('ok'), 10))")
                .await
        }
    });

    let evaluate = remote.next_command().await.expect("evaluate");
    assert_eq!(evaluate.method, "Runtime.evaluate");
    assert_eq!(evaluate.params["awaitPromise"], true);
    remote.respond(
        evaluate.id,
        json!({
            "result": {
                "type": "object",
                "subtype": "promise",
                "className": "Promise",
                "objectId": "promise-1"
            }
        }),
    );

    let await_promise = remote.next_command().await.expect("awaitPromise");
    assert_eq!(await_promise.method, "Runtime.awaitPromise");
    assert_eq!(await_promise.params["promiseObjectId"], "promise-1");
    remote.respond(
        await_promise.id,
        json!({ "result": { "type": "string", "value": "ok" } }),
    );

    let value = evaluating.await.expect("join").expect("settled");
    assert_eq!(value, json!("ok"));
}

#[tokio::test]
async fn test_evaluate_async_rejection_is_exception() {
    let (page, mut remote) = page();

    let evaluating = tokio::spawn({
        let page = page.clone();
        async move { page.evaluate_async("Promise.reject(new Error('nope'))").await }
    });

    let evaluate = remote.next_command().await.expect("evaluate");
    remote.respond(
        evaluate.id,
        json!({
            "result": { "type": "object", "subtype": "error", "description": "Error: nope" },
            "exceptionDetails": {
                "exceptionId": 1,
                "text": "Uncaught (in promise)",
                "lineNumber": 0,
                "columnNumber": 0,
                "exception": { "type": "object", "subtype": "error", "description": "Error: nope" }
            }
        }),
    );

    let err = evaluating.await.expect("join").expect_err("rejected");
    assert!(matches!(err, Error::EvaluationException { ref description } if description.contains("nope")));
}

// ============================================================================
// Interception Scenario
// ============================================================================

#[tokio::test]
async fn test_navigation_with_intercepted_subresource() {
    let (channel, mut remote) = TransportChannel::memory();
    let dp = DomainProxy::new(ProtocolSession::new(channel));
    let page = PageSession::new(dp.clone());
    let interception = InterceptionController::new(dp.clone());

    let enabling = tokio::spawn({
        let interception = interception.clone();
        async move { interception.enable(&[RequestPattern::catch_all()]).await }
    });
    let network_enable = remote.next_command().await.expect("Network.enable");
    assert_eq!(network_enable.method, "Network.enable");
    remote.respond(network_enable.id, json!({}));
    let set = remote.next_command().await.expect("setRequestInterception");
    assert_eq!(set.method, "Network.setRequestInterception");
    remote.respond(set.id, json!({}));
    enabling.await.expect("join").expect("enabled");

    let navigating = tokio::spawn({
        let page = page.clone();
        async move { page.navigate("http://test/index.html").await }
    });
    let page_enable = remote.next_command().await.expect("Page.enable");
    assert_eq!(page_enable.method, "Page.enable");
    remote.respond(page_enable.id, json!({}));
    let navigate = remote.next_command().await.expect("Page.navigate");
    assert_eq!(navigate.params["url"], "http://test/index.html");
    remote.respond(navigate.id, json!({ "frameId": "F1", "loaderId": "L1" }));

    let finished = dp.network().once_loading_finished().expect("waiter");

    remote.emit(
        "Network.requestIntercepted",
        json!({
            "interceptionId": "job-1",
            "request": { "url": "http://test/app.js", "method": "GET", "headers": { "Accept": "*/*" } },
            "frameId": "F1",
            "resourceType": "Script",
            "isNavigationRequest": false
        }),
    );

    let request = interception.next_request().await.expect("intercepted");
    assert_eq!(request.url, "http://test/app.js");
    assert_eq!(request.headers.get("Accept").map(String::as_str), Some("*/*"));

    let continuing = tokio::spawn({
        let interception = interception.clone();
        let id = request.interception_id.clone();
        async move { interception.continue_request(&id).await }
    });
    let cont = remote.next_command().await.expect("continue");
    assert_eq!(cont.method, "Network.continueInterceptedRequest");
    assert_eq!(cont.params, json!({ "interceptionId": "job-1" }));
    remote.respond(cont.id, json!({}));
    continuing.await.expect("join").expect("continued");

    remote.emit("Network.loadingFinished", json!({ "requestId": "R1", "timestamp": 1.5 }));
    remote.emit("Page.loadEventFired", json!({ "timestamp": 2.0 }));

    let event = finished.await.expect("loading finished");
    assert_eq!(event.params["requestId"], "R1");
    navigating.await.expect("join").expect("navigated");

    assert_eq!(
        interception.state(&request.interception_id),
        Some(ResolutionState::Continued)
    );
    assert!(interception.unresolved().is_empty());
    assert!(interception.violations().is_empty());
}

// ============================================================================
// Session Teardown Scenario
// ============================================================================

#[tokio::test]
async fn test_close_fails_every_pending_command() {
    let (channel, mut remote) = TransportChannel::memory();
    let session = ProtocolSession::new(channel);

    let pending: Vec<_> = (0..3)
        .map(|n| session.send_method("Runtime.evaluate", json!({ "expression": n.to_string() })))
        .collect();
    for _ in 0..3 {
        remote.next_command().await.expect("command");
    }
    assert_eq!(session.pending_count(), 3);

    session.close().await;

    for result in join_all(pending).await {
        assert!(result.expect_err("closed").is_session_closed());
    }
    assert!(session.is_closed());
    assert_eq!(session.pending_count(), 0);

    let late = session.send_method("Runtime.enable", json!({})).await;
    assert!(late.expect_err("late").is_session_closed());
}

#[tokio::test]
async fn test_waiter_stays_pending_until_event() {
    init_tracing();
    let (channel, remote) = TransportChannel::memory();
    let session = ProtocolSession::new(channel);

    let mut waiter = task::spawn(session.wait_for("Page.loadEventFired"));
    assert_pending!(waiter.poll());

    remote.emit("Page.frameNavigated", json!({ "frame": { "id": "F1" } }));
    remote.emit("Page.loadEventFired", json!({ "timestamp": 3.0 }));
    tokio::time::timeout(Duration::from_secs(1), async {
        while !waiter.is_woken() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("woken");

    let event = assert_ready_ok!(waiter.poll());
    assert_eq!(event.method, "Page.loadEventFired");
    session.close().await;
}

// ============================================================================
// Harness Scenarios
// ============================================================================

#[tokio::test]
async fn test_run_collects_output_and_closes_targets() {
    let (runner, targets, announced) = memory_runner(HarnessConfig::default());
    spawn_servers(announced);

    let report = runner
        .run("Tests that evaluation reaches the page.", |ctx| async move {
            let target = ctx.start_blank("Tests that evaluation reaches the page.").await?;
            let value = target.session.evaluate("abc").await?;
            ctx.log(format!("length: {value}"));
            ctx.log_json("Payload", &json!({ "b": 1, "a": "x" }));
            ctx.complete_test()
        })
        .await
        .expect("report");

    assert!(report.is_clean());
    assert_eq!(report.log[0], "Tests that evaluation reaches the page.");
    assert_eq!(report.log[1], "length: 3");
    assert_eq!(report.log[2], "Payload\n{\n    a : \"x\",\n    b : 1\n}");
    assert_eq!(targets.closed_targets().len(), 1);
    assert_eq!(targets.closed_targets()[0].as_str(), "memory-1");
}

#[tokio::test]
async fn test_completion_from_event_handler() {
    let (runner, _targets, mut announced) = memory_runner(HarnessConfig::default());

    let engine = tokio::spawn(async move {
        let (_info, mut remote) = announced.recv().await.expect("target");
        let command = remote.next_command().await.expect("evaluate");
        remote.emit("Runtime.consoleAPICalled", json!({ "type": "log", "args": [] }));
        remote.respond(command.id, json!({ "result": { "type": "undefined" } }));
        serve(remote).await;
    });

    let report = runner
        .run("Tests completion from a handler.", |ctx| async move {
            let target = ctx.start_blank("Tests completion from a handler.").await?;
            let handler_ctx = ctx.clone();
            let _subscription = target.protocol().subscribe(
                "Runtime.consoleAPICalled",
                move |_event| {
                    handler_ctx.log("console message");
                    let _ = handler_ctx.complete_test();
                },
                true,
            );
            target.session.evaluate("console.log('ping')").await?;
            Ok(())
        })
        .await
        .expect("report");

    assert!(report.is_clean());
    assert_eq!(report.log.last().map(String::as_str), Some("console message"));
    engine.await.expect("engine");
}

#[tokio::test]
async fn test_second_completion_is_reported() {
    let (runner, _targets, announced) = memory_runner(HarnessConfig::default());
    spawn_servers(announced);

    let report = runner
        .run_report("Tests double completion.", |ctx| async move {
            ctx.start_blank("Tests double completion.").await?;
            ctx.complete_test()?;
            let second = ctx.complete_test();
            assert!(second.expect_err("second").is_protocol_violation());
            Ok(())
        })
        .await
        .expect("report");

    assert!(!report.is_clean());
    assert_eq!(report.violations.len(), 1);
    assert!(report.into_result().is_err());
}

#[tokio::test]
async fn test_violation_fails_the_run() {
    let (runner, targets, announced) = memory_runner(HarnessConfig::default());
    spawn_servers(announced);

    let err = runner
        .run("Tests that a violation is fatal.", |ctx| async move {
            ctx.start_blank("Tests that a violation is fatal.").await?;
            ctx.complete_test()?;
            let _ = ctx.complete_test();
            Ok(())
        })
        .await
        .expect_err("violation");

    assert!(err.is_protocol_violation());
    assert!(err.to_string().contains("already completed"));
    assert_eq!(targets.closed_targets().len(), 1);
}

#[tokio::test]
async fn test_body_without_completion_is_incomplete() {
    let (runner, targets, announced) = memory_runner(HarnessConfig::default());
    spawn_servers(announced);

    let err = runner
        .run("Tests that forget to complete.", |ctx| async move {
            ctx.start_blank("Tests that forget to complete.").await?;
            Ok(())
        })
        .await
        .expect_err("incomplete");

    assert!(matches!(err, Error::IncompleteRun { ref description } if description == "Tests that forget to complete."));
    assert_eq!(targets.closed_targets().len(), 1);
}

#[tokio::test]
async fn test_body_error_is_returned_after_teardown() {
    let (runner, targets, announced) = memory_runner(HarnessConfig::default());
    spawn_servers(announced);

    let err = runner
        .run("Tests that fail.", |ctx| async move {
            ctx.start_blank("Tests that fail.").await?;
            Err(Error::invalid_argument("body gave up"))
        })
        .await
        .expect_err("body error");

    assert!(matches!(err, Error::InvalidArgument { .. }));
    assert_eq!(targets.closed_targets().len(), 1);
}

#[tokio::test]
async fn test_run_timeout() {
    let config = HarnessConfig::builder()
        .run_timeout(Duration::from_millis(50))
        .build()
        .expect("config");
    let (runner, targets, announced) = memory_runner(config);
    spawn_servers(announced);

    let err = runner
        .run("Tests that hang.", |ctx| async move {
            ctx.start_blank("Tests that hang.").await?;
            let _keep = ctx;
            std::future::pending::<inspector_harness::Result<()>>().await
        })
        .await
        .expect_err("timeout");

    assert!(err.is_timeout());
    assert_eq!(targets.closed_targets().len(), 1);
}

#[tokio::test]
async fn test_unresolved_interception_is_reported() {
    let (runner, _targets, mut announced) = memory_runner(HarnessConfig::default());

    let engine = tokio::spawn(async move {
        let (_info, mut remote) = announced.recv().await.expect("target");
        for _ in 0..2 {
            let command = remote.next_command().await.expect("command");
            remote.respond(command.id, json!({}));
        }
        remote.emit(
            "Network.requestIntercepted",
            json!({
                "interceptionId": "job-7",
                "request": { "url": "http://test/style.css", "method": "GET", "headers": {} },
                "frameId": "F1",
                "resourceType": "Stylesheet",
                "isNavigationRequest": false
            }),
        );
        serve(remote).await;
    });

    let report = runner
        .run_report("Tests leaking an interception.", |ctx| async move {
            let target = ctx.start_blank("Tests leaking an interception.").await?;
            target.interception.enable(&[RequestPattern::catch_all()]).await?;
            let request = target.interception.next_request().await?;
            ctx.log(&request.url);
            ctx.complete_test()
        })
        .await
        .expect("report");

    assert_eq!(
        report.violations,
        vec!["interception job-7 for http://test/style.css was never resolved".to_string()]
    );
    engine.await.expect("engine");
}

#[tokio::test]
async fn test_malformed_interception_event_is_reported() {
    let (runner, _targets, mut announced) = memory_runner(HarnessConfig::default());

    let engine = tokio::spawn(async move {
        let (_info, mut remote) = announced.recv().await.expect("target");
        for _ in 0..2 {
            let command = remote.next_command().await.expect("command");
            remote.respond(command.id, json!({}));
        }
        remote.emit("Network.requestIntercepted", json!({ "interceptionId": 42 }));
        remote.emit(
            "Network.requestIntercepted",
            json!({
                "interceptionId": "job-8",
                "request": { "url": "http://test/app.js", "method": "GET", "headers": {} },
                "frameId": "F1",
                "resourceType": "Script",
                "isNavigationRequest": false
            }),
        );
        serve(remote).await;
    });

    let report = runner
        .run_report("Tests a malformed interception.", |ctx| async move {
            let target = ctx.start_blank("Tests a malformed interception.").await?;
            target.interception.enable(&[RequestPattern::catch_all()]).await?;
            let request = target.interception.next_request().await?;
            target.interception.continue_request(&request.interception_id).await?;
            ctx.complete_test()
        })
        .await
        .expect("report");

    assert_eq!(report.violations.len(), 1);
    assert!(report.violations[0].starts_with("malformed Network.requestIntercepted"));
    engine.await.expect("engine");
}

#[tokio::test]
async fn test_targets_kept_when_configured() -> anyhow::Result<()> {
    let config = HarnessConfig::builder().close_targets(false).build()?;
    let (runner, targets, announced) = memory_runner(config);
    spawn_servers(announced);

    let report = runner
        .run("Tests keeping targets.", |ctx| async move {
            ctx.start_html("<p>hi</p>", "Tests keeping targets.").await?;
            ctx.complete_test()
        })
        .await?;

    assert!(report.is_clean());
    assert!(targets.closed_targets().is_empty());
    Ok(())
}

// ============================================================================
// Correlation Property
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Every response reaches the command with its id, whatever the order.
    #[test]
    fn prop_responses_match_commands_in_any_order(
        order in (1usize..12).prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle())
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");

        let results: Vec<Value> = runtime.block_on(async {
            let (channel, mut remote) = TransportChannel::memory();
            let session = ProtocolSession::new(channel);

            let futures: Vec<_> = (0..order.len())
                .map(|n| session.send_method("Runtime.evaluate", json!({ "expression": n.to_string() })))
                .collect();

            let mut commands = Vec::new();
            for _ in 0..order.len() {
                commands.push(remote.next_command().await.expect("command"));
            }
            for &index in &order {
                let command = &commands[index];
                remote.respond(command.id, json!({ "echo": command.params["expression"] }));
            }

            let results = join_all(futures).await;
            assert_eq!(session.pending_count(), 0);
            session.close().await;
            results.into_iter().map(|r| r.expect("response")).collect()
        });

        for (n, result) in results.iter().enumerate() {
            prop_assert_eq!(&result["echo"], &json!(n.to_string()));
        }
    }
}
