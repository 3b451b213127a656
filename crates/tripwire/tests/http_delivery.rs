// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tripwire::host::InMemoryHost;
use tripwire::transport::HttpTransport;
use tripwire::{Monitor, MonitorConfig, RejectionEvent};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

async fn wait_for_requests(server: &MockServer, count: usize) -> Vec<Request> {
	let deadline = Instant::now() + Duration::from_secs(5);
	loop {
		let received = server.received_requests().await.unwrap_or_default();
		if received.len() >= count || Instant::now() > deadline {
			return received;
		}
		tokio::time::sleep(Duration::from_millis(20)).await;
	}
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejection_is_posted_to_endpoint() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/api/errors"))
		.and(header("content-type", "application/json"))
		.respond_with(ResponseTemplate::new(202))
		.expect(1)
		.mount(&server)
		.await;

	let host = Arc::new(InMemoryHost::new().with_page_url("https://shop.example.com/"));
	let monitor = Monitor::new(host.clone(), Arc::new(HttpTransport::new().unwrap()));
	monitor.setup(
		MonitorConfig::builder()
			.app_id("shop")
			.endpoint(format!("{}/api/errors", server.uri()))
			.build()
			.unwrap(),
	);

	host.reject(&RejectionEvent::new(json!({
		"message": "Network Error",
		"response": {"config": {"method": "get", "url": "/api/cart"}},
	})));

	let received = wait_for_requests(&server, 1).await;
	assert_eq!(received.len(), 1);
	let body: Value = serde_json::from_slice(&received[0].body).unwrap();
	assert_eq!(body["type"], "unhandled-rejection");
	assert_eq!(body["appId"], "shop");
	assert_eq!(body["url"], "https://shop.example.com/");
	let res_config: Value = serde_json::from_str(body["resConfig"].as_str().unwrap()).unwrap();
	assert_eq!(res_config, json!({"method": "get", "url": "/api/cart"}));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_delivery_does_not_reach_caller() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(503))
		.mount(&server)
		.await;

	let host = Arc::new(InMemoryHost::new());
	let monitor = Monitor::new(host.clone(), Arc::new(HttpTransport::new().unwrap()));
	monitor.setup(
		MonitorConfig::builder()
			.endpoint(server.uri())
			.build()
			.unwrap(),
	);

	host.reject(&RejectionEvent::new(json!("down")));

	let received = wait_for_requests(&server, 1).await;
	assert_eq!(received.len(), 1);
	tokio::time::sleep(Duration::from_millis(200)).await;
	assert_eq!(server.received_requests().await.unwrap().len(), 1);
}
