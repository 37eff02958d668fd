// Shared test helpers: a scripted fake gateway and test-case builders.
use async_trait::async_trait;
use promptspec::core::spec::{Assertion, TestCase};
use promptspec::infra::gateway::{Gateway, GatewayError, GatewayResponse, InvokeRequest};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// One scripted reaction of the fake gateway. Steps are consumed per model,
/// in order; once a model's script runs dry the gateway falls back to a
/// canned reply.
#[allow(dead_code)]
pub enum Script {
    /// Reply immediately with the given text.
    Reply(&'static str),
    /// Reply with the given text after a delay (drives completion reordering).
    ReplyAfter(&'static str, Duration),
    /// Signal a rate-limit condition.
    RateLimit,
    /// Signal a hard transport failure.
    Fail(&'static str),
    /// Never reply; the caller's timeout has to fire.
    Hang,
}

/// In-memory gateway standing in for the HTTP transport. Tracks the number
/// of concurrently in-flight calls so tests can check the concurrency bound.
pub struct FakeGateway {
    scripts: Mutex<HashMap<String, VecDeque<Script>>>,
    fallback: String,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[allow(dead_code)]
impl FakeGateway {
    pub fn new(fallback: &str) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            fallback: fallback.to_string(),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Appends a scripted step for the given model.
    pub fn script(&self, model: &str, step: Script) {
        self.scripts
            .lock()
            .unwrap()
            .entry(model.to_string())
            .or_default()
            .push_back(step);
    }

    /// Total number of invoke calls observed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously in-flight calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// Decrements the in-flight counter even when the invoke future is dropped
/// by a caller-side timeout.
struct InFlightGuard<'a>(&'a FakeGateway);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn invoke(&self, request: InvokeRequest) -> Result<GatewayResponse, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlightGuard(self);

        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&request.model)
            .and_then(|queue| queue.pop_front());

        match step {
            None => Ok(GatewayResponse {
                text: self.fallback.clone(),
                latency: Duration::from_millis(1),
            }),
            Some(Script::Reply(text)) => Ok(GatewayResponse {
                text: text.to_string(),
                latency: Duration::from_millis(1),
            }),
            Some(Script::ReplyAfter(text, delay)) => {
                tokio::time::sleep(delay).await;
                Ok(GatewayResponse {
                    text: text.to_string(),
                    latency: delay,
                })
            }
            Some(Script::RateLimit) => Err(GatewayError::RateLimited("simulated 429".to_string())),
            Some(Script::Fail(message)) => Err(GatewayError::Other(message.to_string())),
            Some(Script::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(GatewayError::Other("hung call returned".to_string()))
            }
        }
    }
}

/// Builds a resolved test case the way the spec loader would emit it.
#[allow(dead_code)]
pub fn case(description: &str, model: &str, assertions: Vec<Assertion>) -> TestCase {
    TestCase {
        description: description.to_string(),
        prompt: "test prompt".to_string(),
        model: model.to_string(),
        temperature: 0.0,
        timeout_secs: None,
        retries: None,
        assertions,
    }
}
