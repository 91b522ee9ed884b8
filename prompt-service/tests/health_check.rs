//! Full-stack tests against a running server and a real Postgres.
//!
//! Set TEST_DATABASE_URL to run these; without it each test is a no-op so the
//! suite still passes on machines without a database.

use std::sync::Arc;

use prompt_service::config::{
    AuthConfig, DatabaseConfig, Environment, GoogleConfig, RateLimitConfig, SecurityConfig,
    ServiceConfig,
};
use prompt_service::services::providers::mock::MockChatProvider;
use prompt_service::startup::Application;
use service_core::config::Config as CommonConfig;
use uuid::Uuid;

fn test_database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL").ok()
}

fn test_config(database_url: String) -> ServiceConfig {
    ServiceConfig {
        common: CommonConfig { port: 0 },
        environment: Environment::Dev,
        service_name: "prompt-service".to_string(),
        service_version: "test".to_string(),
        log_level: "info".to_string(),
        database: DatabaseConfig {
            url: database_url,
            max_connections: 5,
            min_connections: 1,
        },
        auth: AuthConfig {
            secret_key: "integration-test-secret".to_string(),
            expire_minutes: 15,
        },
        google: GoogleConfig {
            api_key: "unused".to_string(),
            model: "gemini-2.5-flash".to_string(),
        },
        security: SecurityConfig {
            allowed_origins: vec!["*".to_string()],
        },
        rate_limit: RateLimitConfig { per_minute: 10_000 },
        swagger_enabled: true,
        otlp_endpoint: None,
    }
}

/// Spawn the application on a random port and return its base URL.
async fn spawn_app(database_url: String, provider: Arc<MockChatProvider>) -> String {
    let app = Application::build_with_provider(test_config(database_url), provider)
        .await
        .expect("failed to build application");
    let port = app.port();
    tokio::spawn(app.run_until_stopped());
    format!("http://127.0.0.1:{}", port)
}

async fn fetch_token(client: &reqwest::Client, base: &str, user_id: &str) -> String {
    let response = client
        .post(format!("{}/auth/token", base))
        .json(&serde_json::json!({ "user_id": user_id }))
        .send()
        .await
        .expect("token request failed");
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let body: serde_json::Value = response.json().await.expect("token body");
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["expires_in"], 15 * 60);
    body["access_token"].as_str().expect("access_token").to_string()
}

#[tokio::test]
async fn health_check_reports_ok() {
    let Some(url) = test_database_url() else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };
    let base = spawn_app(url, Arc::new(MockChatProvider::collecting("unused"))).await;

    let response = reqwest::Client::new()
        .get(format!("{}/health", base))
        .send()
        .await
        .expect("health request failed");
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let body: serde_json::Value = response.json().await.expect("health body");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "prompt-service");
}

#[tokio::test]
async fn chat_session_lifecycle() {
    let Some(url) = test_database_url() else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };
    let provider = Arc::new(MockChatProvider::collecting(
        "What is the target audience for this prompt?",
    ));
    let base = spawn_app(url, provider.clone()).await;
    let client = reqwest::Client::new();

    let user_id = format!("user-{}", Uuid::new_v4());
    let token = fetch_token(&client, &base, &user_id).await;
    let session_id = format!("session-{}", Uuid::new_v4().simple());

    // First turn creates the session on the fly.
    let response = client
        .post(format!("{}/chat", base))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "session_id": session_id,
            "user_input": "I need a prompt for writing release notes"
        }))
        .send()
        .await
        .expect("chat request failed");
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let reply: serde_json::Value = response.json().await.expect("chat body");
    assert_eq!(reply["status"], "collecting");
    assert_eq!(
        reply["question_text"],
        "What is the target audience for this prompt?"
    );
    assert_eq!(provider.call_count(), 1);

    // The session is listed for its owner.
    let response = client
        .get(format!("{}/sessions", base))
        .bearer_auth(&token)
        .send()
        .await
        .expect("sessions request failed");
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let sessions: serde_json::Value = response.json().await.expect("sessions body");
    let listed = sessions["sessions"]
        .as_array()
        .expect("sessions array")
        .iter()
        .any(|s| s["id"] == session_id.as_str() && s["message_count"] == 2);
    assert!(listed, "expected {} in {}", session_id, sessions);

    // History holds the user turn and the model turn, oldest first.
    let response = client
        .get(format!("{}/history/{}", base, session_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("history request failed");
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let history: serde_json::Value = response.json().await.expect("history body");
    let messages = history["messages"].as_array().expect("messages array");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[1]["role"], "model");

    // Summary only surfaces the user's side of the conversation.
    let response = client
        .get(format!("{}/summary/{}", base, session_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("summary request failed");
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let summary: serde_json::Value = response.json().await.expect("summary body");
    let inputs = summary["user_answers"].as_array().expect("user_answers");
    assert_eq!(inputs.len(), 1);
    assert_eq!(inputs[0], "I need a prompt for writing release notes");

    // Another user cannot see the session.
    let other_token = fetch_token(&client, &base, &format!("user-{}", Uuid::new_v4())).await;
    let response = client
        .get(format!("{}/history/{}", base, session_id))
        .bearer_auth(&other_token)
        .send()
        .await
        .expect("foreign history request failed");
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let history: serde_json::Value = response.json().await.expect("foreign history body");
    assert!(history["messages"].as_array().expect("messages").is_empty());

    // Reset deletes the session; a second reset reports nothing removed.
    let response = client
        .post(format!("{}/reset", base))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "session_id": session_id }))
        .send()
        .await
        .expect("reset request failed");
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let reset: serde_json::Value = response.json().await.expect("reset body");
    assert_eq!(reset["reset"], true);

    let response = client
        .post(format!("{}/reset", base))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "session_id": session_id }))
        .send()
        .await
        .expect("second reset request failed");
    let reset: serde_json::Value = response.json().await.expect("second reset body");
    assert_eq!(reset["reset"], false);

    let response = client
        .get(format!("{}/history/{}", base, session_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("post-reset history request failed");
    let history: serde_json::Value = response.json().await.expect("post-reset history body");
    assert!(history["messages"].as_array().expect("messages").is_empty());
}

#[tokio::test]
async fn history_preserves_turn_order_across_exchanges() {
    let Some(url) = test_database_url() else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };
    let base = spawn_app(url, Arc::new(MockChatProvider::collecting("Next?"))).await;
    let client = reqwest::Client::new();

    let token = fetch_token(&client, &base, &format!("user-{}", Uuid::new_v4())).await;
    let session_id = format!("session-{}", Uuid::new_v4().simple());

    let inputs = ["first answer", "second answer", "third answer", "fourth answer"];
    for input in inputs {
        let response = client
            .post(format!("{}/chat", base))
            .bearer_auth(&token)
            .json(&serde_json::json!({
                "session_id": session_id,
                "user_input": input
            }))
            .send()
            .await
            .expect("chat request failed");
        assert_eq!(response.status(), reqwest::StatusCode::OK);
    }

    // Both turns of an exchange share a created_at, so this only holds if
    // ordering follows the insert sequence.
    let response = client
        .get(format!("{}/history/{}", base, session_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("history request failed");
    let history: serde_json::Value = response.json().await.expect("history body");
    let messages = history["messages"].as_array().expect("messages array");
    assert_eq!(messages.len(), inputs.len() * 2);
    for (i, message) in messages.iter().enumerate() {
        let expected_role = if i % 2 == 0 { "user" } else { "model" };
        assert_eq!(message["role"], expected_role, "message {} out of order", i);
        if i % 2 == 0 {
            assert_eq!(message["content"], inputs[i / 2]);
        }
    }

    // Summary sees the same ordering.
    let response = client
        .get(format!("{}/summary/{}", base, session_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("summary request failed");
    let summary: serde_json::Value = response.json().await.expect("summary body");
    let answers: Vec<&str> = summary["user_answers"]
        .as_array()
        .expect("user_answers")
        .iter()
        .map(|a| a.as_str().unwrap())
        .collect();
    assert_eq!(answers, inputs);
}

#[tokio::test]
async fn provider_failure_maps_to_bad_gateway() {
    let Some(url) = test_database_url() else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };
    let base = spawn_app(url, Arc::new(MockChatProvider::failing())).await;
    let client = reqwest::Client::new();

    let user_id = format!("user-{}", Uuid::new_v4());
    let token = fetch_token(&client, &base, &user_id).await;
    let session_id = format!("session-{}", Uuid::new_v4().simple());

    let response = client
        .post(format!("{}/chat", base))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "session_id": session_id,
            "user_input": "hello"
        }))
        .send()
        .await
        .expect("chat request failed");
    assert_eq!(response.status(), reqwest::StatusCode::BAD_GATEWAY);

    // The session row exists from the failed turn, but no exchange was
    // persisted.
    let response = client
        .get(format!("{}/history/{}", base, session_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("history request failed");
    let history: serde_json::Value = response.json().await.expect("history body");
    assert!(history["messages"].as_array().expect("messages").is_empty());
}
