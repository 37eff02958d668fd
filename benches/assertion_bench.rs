use async_trait::async_trait;
use criterion::{criterion_group, criterion_main, Criterion};
use promptspec::core::assertions::AssertionEngine;
use promptspec::core::models::ModelResponse;
use promptspec::core::spec::Assertion;
use promptspec::infra::gateway::{Gateway, GatewayError, GatewayResponse, InvokeRequest};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

/// Gateway stub for benching the pure evaluators; none of them call it.
struct NullGateway;

#[async_trait]
impl Gateway for NullGateway {
    async fn invoke(&self, _request: InvokeRequest) -> Result<GatewayResponse, GatewayError> {
        Err(GatewayError::Other("bench gateway".to_string()))
    }
}

fn sample_response() -> ModelResponse {
    let paragraph = r#"{"customer": "Alex", "status": "delayed", "message": "We are very sorry about the delay. Your order should arrive within 3 business days. If it does not, please reply to this message and we will investigate immediately."}"#;
    ModelResponse {
        text: paragraph.repeat(8),
        latency: Duration::from_millis(850),
    }
}

fn bench_evaluators(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let engine = AssertionEngine::new(
        Arc::new(NullGateway),
        "judge".to_string(),
        Duration::from_secs(5),
    );
    let response = sample_response();

    let assertions = [
        (
            "contains",
            Assertion::Contains {
                value: "business days".to_string(),
            },
        ),
        (
            "regex",
            Assertion::Regex {
                pattern: r"\b\d+ business days\b".to_string(),
            },
        ),
        ("json_valid", Assertion::JsonValid),
        ("no_pii", Assertion::NoPii),
    ];

    for (name, assertion) in &assertions {
        c.bench_function(&format!("evaluate_{name}"), |b| {
            b.to_async(&rt).iter(|| async {
                let _ = engine.evaluate(assertion, &response).await;
            });
        });
    }
}

criterion_group!(benches, bench_evaluators);
criterion_main!(benches);
