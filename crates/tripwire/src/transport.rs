// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Network delivery of report payloads.
//!
//! [`Transport::post_json`] is fire and forget: it returns before the request
//! completes, nothing is retried, and failures only show up in the logs.
//! [`Transport::post_json_blocking`] is for reports raised while the process
//! is going down; it waits for the request to finish or time out.

use std::sync::{mpsc, Arc, OnceLock};
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::Result;

/// Default timeout for a single delivery request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Extra time a blocking post waits beyond the request timeout.
const WORKER_GRACE: Duration = Duration::from_millis(500);

const WORKER_THREAD_NAME: &str = "tripwire-delivery";

/// Submits a JSON body to an address.
pub trait Transport: Send + Sync {
	/// Starts the submission without waiting for the outcome.
	fn post_json(&self, endpoint: &str, body: String);

	/// Returns once the submission has finished, failed or timed out.
	fn post_json_blocking(&self, endpoint: &str, body: String) {
		self.post_json(endpoint, body);
	}
}

#[derive(Debug)]
struct DeliveryJob {
	endpoint: String,
	body: String,
	done: Option<mpsc::Sender<()>>,
}

/// [`Transport`] backed by reqwest.
///
/// Inside a tokio runtime a background post is spawned onto it. Everything
/// else goes through one lazily started delivery thread that owns a single
/// blocking client, so the blocking client is never created or dropped
/// inside a runtime.
#[derive(Debug, Clone)]
pub struct HttpTransport {
	client: Client,
	timeout: Duration,
	worker: Arc<OnceLock<Option<mpsc::Sender<DeliveryJob>>>>,
}

impl HttpTransport {
	pub fn new() -> Result<Self> {
		Self::with_timeout(DEFAULT_TIMEOUT)
	}

	pub fn with_timeout(timeout: Duration) -> Result<Self> {
		let client = tripwire_common_http::builder().timeout(timeout).build()?;
		Ok(Self {
			client,
			timeout,
			worker: Arc::new(OnceLock::new()),
		})
	}

	fn enqueue(&self, job: DeliveryJob) -> bool {
		let Some(worker) = self
			.worker
			.get_or_init(|| spawn_worker(self.timeout))
			.as_ref()
		else {
			return false;
		};
		if worker.send(job).is_err() {
			warn!("Report delivery thread has stopped");
			return false;
		}
		true
	}
}

fn spawn_worker(timeout: Duration) -> Option<mpsc::Sender<DeliveryJob>> {
	let (jobs, queue) = mpsc::channel();
	match std::thread::Builder::new()
		.name(WORKER_THREAD_NAME.to_string())
		.spawn(move || run_worker(timeout, queue))
	{
		Ok(_) => Some(jobs),
		Err(e) => {
			warn!(error = %e, "Failed to start report delivery thread");
			None
		}
	}
}

fn run_worker(timeout: Duration, queue: mpsc::Receiver<DeliveryJob>) {
	let client = match tripwire_common_http::blocking_builder()
		.timeout(timeout)
		.build()
	{
		Ok(client) => client,
		Err(e) => {
			warn!(error = %e, "Failed to build blocking HTTP client for report delivery");
			return;
		}
	};

	for job in queue {
		send_blocking(&client, &job.endpoint, job.body);
		if let Some(done) = job.done {
			let _ = done.send(());
		}
	}
}

fn send_blocking(client: &reqwest::blocking::Client, endpoint: &str, body: String) {
	match client
		.post(endpoint)
		.header(CONTENT_TYPE, "application/json")
		.body(body)
		.send()
	{
		Ok(response) if response.status().is_success() => {
			debug!(endpoint = %endpoint, "Report delivered");
		}
		Ok(response) => {
			let status = response.status().as_u16();
			warn!(endpoint = %endpoint, status, "Report endpoint rejected payload");
		}
		Err(e) => {
			warn!(endpoint = %endpoint, error = %e, "Report delivery failed");
		}
	}
}

impl Transport for HttpTransport {
	fn post_json(&self, endpoint: &str, body: String) {
		let endpoint = endpoint.to_string();

		match tokio::runtime::Handle::try_current() {
			Ok(handle) => {
				let client = self.client.clone();
				handle.spawn(async move {
					match client
						.post(&endpoint)
						.header(CONTENT_TYPE, "application/json")
						.body(body)
						.send()
						.await
					{
						Ok(response) if response.status().is_success() => {
							debug!(endpoint = %endpoint, "Report delivered");
						}
						Ok(response) => {
							let status = response.status().as_u16();
							warn!(endpoint = %endpoint, status, "Report endpoint rejected payload");
						}
						Err(e) => {
							warn!(endpoint = %endpoint, error = %e, "Report delivery failed");
						}
					}
				});
			}
			Err(_) => {
				self.enqueue(DeliveryJob {
					endpoint,
					body,
					done: None,
				});
			}
		}
	}

	fn post_json_blocking(&self, endpoint: &str, body: String) {
		// The delivery thread cannot wait on itself.
		if std::thread::current().name() == Some(WORKER_THREAD_NAME) {
			warn!(endpoint = %endpoint, "Report raised on the delivery thread was not sent");
			return;
		}

		let (done, finished) = mpsc::channel();
		let queued = self.enqueue(DeliveryJob {
			endpoint: endpoint.to_string(),
			body,
			done: Some(done),
		});
		if queued && finished.recv_timeout(self.timeout + WORKER_GRACE).is_err() {
			warn!(endpoint = %endpoint, "Gave up waiting for report delivery");
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Instant;
	use wiremock::matchers::{body_json, header, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	async fn wait_for_requests(server: &MockServer, count: usize) -> Vec<wiremock::Request> {
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
	async fn posts_json_inside_runtime() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/report"))
			.and(header("content-type", "application/json"))
			.and(body_json(serde_json::json!({"type": "test"})))
			.respond_with(ResponseTemplate::new(204))
			.expect(1)
			.mount(&server)
			.await;

		let transport = HttpTransport::new().unwrap();
		transport.post_json(&format!("{}/report", server.uri()), r#"{"type":"test"}"#.to_string());

		let received = wait_for_requests(&server, 1).await;
		assert_eq!(received.len(), 1);
	}

	#[tokio::test(flavor = "multi_thread")]
	async fn server_errors_are_not_retried() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(500))
			.mount(&server)
			.await;

		let transport = HttpTransport::new().unwrap();
		transport.post_json(&server.uri(), "{}".to_string());

		wait_for_requests(&server, 1).await;
		tokio::time::sleep(Duration::from_millis(200)).await;
		assert_eq!(server.received_requests().await.unwrap().len(), 1);
	}

	#[test]
	fn posts_from_plain_thread_without_runtime() {
		let runtime = tokio::runtime::Runtime::new().unwrap();
		let server = runtime.block_on(async {
			let server = MockServer::start().await;
			Mock::given(method("POST"))
				.and(header("content-type", "application/json"))
				.respond_with(ResponseTemplate::new(200))
				.mount(&server)
				.await;
			server
		});

		let transport = HttpTransport::new().unwrap();
		transport.post_json(&server.uri(), "[]".to_string());

		let received = runtime.block_on(wait_for_requests(&server, 1));
		assert_eq!(received.len(), 1);
	}

	fn start_server(runtime: &tokio::runtime::Runtime) -> MockServer {
		runtime.block_on(async {
			let server = MockServer::start().await;
			Mock::given(method("POST"))
				.respond_with(ResponseTemplate::new(200))
				.mount(&server)
				.await;
			server
		})
	}

	#[test]
	fn blocking_post_returns_after_request_is_received() {
		let runtime = tokio::runtime::Runtime::new().unwrap();
		let server = start_server(&runtime);

		let transport = HttpTransport::new().unwrap();
		transport.post_json_blocking(&server.uri(), r#"{"type":"runtime-error"}"#.to_string());

		let received = runtime.block_on(server.received_requests()).unwrap();
		assert_eq!(received.len(), 1);
		let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
		assert_eq!(body["type"], "runtime-error");
	}

	#[tokio::test(flavor = "multi_thread")]
	async fn blocking_post_inside_runtime() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200))
			.mount(&server)
			.await;

		let transport = HttpTransport::new().unwrap();
		transport.post_json_blocking(&server.uri(), "{}".to_string());

		assert_eq!(server.received_requests().await.unwrap().len(), 1);
	}

	#[test]
	fn background_posts_without_runtime_share_one_worker() {
		let runtime = tokio::runtime::Runtime::new().unwrap();
		let server = start_server(&runtime);

		let transport = HttpTransport::new().unwrap();
		let copy = transport.clone();
		for i in 0..5 {
			transport.post_json(&server.uri(), format!(r#"{{"n":{i}}}"#));
		}
		copy.post_json_blocking(&server.uri(), r#"{"n":5}"#.to_string());

		assert!(Arc::ptr_eq(&transport.worker, &copy.worker));
		// Jobs are sent in order, so the blocking one finishing means all did.
		assert_eq!(runtime.block_on(server.received_requests()).unwrap().len(), 6);
	}

	#[test]
	fn blocking_post_to_unreachable_endpoint_returns() {
		let transport = HttpTransport::with_timeout(Duration::from_secs(2)).unwrap();
		let started = Instant::now();

		transport.post_json_blocking("http://127.0.0.1:9/report", "{}".to_string());

		assert!(started.elapsed() < Duration::from_secs(3));
	}
}
