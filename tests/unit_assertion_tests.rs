//! # Assertion Engine Unit Tests / 断言引擎单元测试
//!
//! Exercises every evaluator against canned responses, including the judge
//! path of `sentiment` through a scripted fake gateway.
//!
//! 用固定响应测试每个求值器，包括通过脚本化假网关的 `sentiment` 裁判路径。

mod common;

use common::{FakeGateway, Script};
use promptspec::core::assertions::AssertionEngine;
use promptspec::core::models::ModelResponse;
use promptspec::core::spec::Assertion;
use std::sync::Arc;
use std::time::Duration;

const JUDGE: &str = "judge-model";

fn engine(gateway: Arc<FakeGateway>) -> AssertionEngine {
    AssertionEngine::new(gateway, JUDGE.to_string(), Duration::from_secs(5))
}

fn response(text: &str, latency_ms: u64) -> ModelResponse {
    ModelResponse {
        text: text.to_string(),
        latency: Duration::from_millis(latency_ms),
    }
}

#[tokio::test]
async fn contains_is_case_insensitive() {
    let engine = engine(Arc::new(FakeGateway::new("")));
    let assertion = Assertion::Contains {
        value: "HELLO".to_string(),
    };

    let result = engine.evaluate(&assertion, &response("Hello there", 10)).await;
    assert!(result.passed);

    let result = engine.evaluate(&assertion, &response("Goodbye", 10)).await;
    assert!(!result.passed);
    assert!(result.explanation.contains("HELLO"));
}

#[tokio::test]
async fn contains_empty_value_always_passes() {
    let engine = engine(Arc::new(FakeGateway::new("")));
    let assertion = Assertion::Contains {
        value: String::new(),
    };

    let result = engine.evaluate(&assertion, &response("anything at all", 10)).await;
    assert!(result.passed);
}

#[tokio::test]
async fn regex_searches_the_response() {
    let engine = engine(Arc::new(FakeGateway::new("")));
    let assertion = Assertion::Regex {
        pattern: "(yes|no)".to_string(),
    };

    let result = engine
        .evaluate(&assertion, &response("The answer is no.", 10))
        .await;
    assert!(result.passed);

    let result = engine.evaluate(&assertion, &response("Maybe.", 10)).await;
    assert!(!result.passed);
}

#[tokio::test]
async fn regex_is_case_insensitive_and_multi_line() {
    let engine = engine(Arc::new(FakeGateway::new("")));
    let assertion = Assertion::Regex {
        pattern: "^answer:".to_string(),
    };

    let result = engine
        .evaluate(&assertion, &response("preamble\nAnswer: 42", 10))
        .await;
    assert!(result.passed);
}

#[tokio::test]
async fn json_valid_parses_text_as_given() {
    let engine = engine(Arc::new(FakeGateway::new("")));

    let result = engine
        .evaluate(&Assertion::JsonValid, &response(r#"{"name": "Bob", "age": 30}"#, 10))
        .await;
    assert!(result.passed);

    // Unquoted key is not well-formed JSON.
    let result = engine
        .evaluate(&Assertion::JsonValid, &response(r#"{"name": "Bob", age: 30}"#, 10))
        .await;
    assert!(!result.passed);

    // Surrounding prose is not stripped.
    let result = engine
        .evaluate(&Assertion::JsonValid, &response("Here you go: {\"a\": 1}", 10))
        .await;
    assert!(!result.passed);
}

#[tokio::test]
async fn latency_threshold_is_inclusive() {
    let engine = engine(Arc::new(FakeGateway::new("")));
    let assertion = Assertion::Latency { threshold_ms: 1000 };

    assert!(engine.evaluate(&assertion, &response("x", 999)).await.passed);
    assert!(engine.evaluate(&assertion, &response("x", 1000)).await.passed);

    let result = engine.evaluate(&assertion, &response("x", 1500)).await;
    assert!(!result.passed);
    assert!(result.explanation.contains("1500"));
    assert!(result.explanation.contains("1000"));
}

#[tokio::test]
async fn no_pii_names_the_detected_category() {
    let engine = engine(Arc::new(FakeGateway::new("")));

    let result = engine
        .evaluate(&Assertion::NoPii, &response("Contact support@example.com", 10))
        .await;
    assert!(!result.passed);
    assert!(result.explanation.contains("email"));

    let result = engine
        .evaluate(&Assertion::NoPii, &response("Call 555-123-4567 now", 10))
        .await;
    assert!(!result.passed);
    assert!(result.explanation.contains("phone"));

    let result = engine
        .evaluate(&Assertion::NoPii, &response("SSN: 123-45-6789", 10))
        .await;
    assert!(!result.passed);
    assert!(result.explanation.contains("ssn"));

    let result = engine
        .evaluate(
            &Assertion::NoPii,
            &response("Card: 4111 1111 1111 1111", 10),
        )
        .await;
    assert!(!result.passed);
    assert!(result.explanation.contains("credit_card"));

    let result = engine
        .evaluate(&Assertion::NoPii, &response("The weather is nice today.", 10))
        .await;
    assert!(result.passed);
}

#[tokio::test]
async fn sentiment_passes_on_affirmative_judge_verdict() {
    let gateway = Arc::new(FakeGateway::new(""));
    gateway.script(JUDGE, Script::Reply("YES"));
    let engine = engine(gateway.clone());

    let assertion = Assertion::Sentiment {
        condition: "polite".to_string(),
    };
    let result = engine
        .evaluate(&assertion, &response("Thank you so much!", 10))
        .await;

    assert!(result.passed);
    assert_eq!(gateway.calls(), 1);
}

#[tokio::test]
async fn sentiment_fails_on_negative_judge_verdict() {
    let gateway = Arc::new(FakeGateway::new(""));
    gateway.script(JUDGE, Script::Reply("NO"));
    let engine = engine(gateway);

    let assertion = Assertion::Sentiment {
        condition: "polite".to_string(),
    };
    let result = engine
        .evaluate(&assertion, &response("Figure it out yourself.", 10))
        .await;

    assert!(!result.passed);
    assert!(result.explanation.contains("polite"));
}

#[tokio::test]
async fn sentiment_judge_failure_is_an_assertion_failure_not_a_pass() {
    let gateway = Arc::new(FakeGateway::new(""));
    gateway.script(JUDGE, Script::Fail("judge backend down"));
    let engine = engine(gateway);

    let assertion = Assertion::Sentiment {
        condition: "positive".to_string(),
    };
    let result = engine.evaluate(&assertion, &response("Great!", 10)).await;

    assert!(!result.passed);
    assert!(result.explanation.contains("judge call failed"));
}

#[tokio::test(start_paused = true)]
async fn sentiment_judge_hang_is_bounded_by_the_judge_timeout() {
    let gateway = Arc::new(FakeGateway::new(""));
    gateway.script(JUDGE, Script::Hang);
    let engine = AssertionEngine::new(gateway, JUDGE.to_string(), Duration::from_secs(2));

    let assertion = Assertion::Sentiment {
        condition: "positive".to_string(),
    };
    let result = engine.evaluate(&assertion, &response("Great!", 10)).await;

    assert!(!result.passed);
    assert!(result.explanation.contains("judge call failed"));
}
