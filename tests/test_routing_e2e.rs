//! End-to-end routing scenarios through the full service wiring
//!
//! Each test stands up wiremock endpoints for the classification LLM and the
//! specialist agents, builds the production service from configuration, and
//! asserts on the terminal task the caller observes.


use medhub::protocol::TaskState;
use medhub::service::HubService;
use medhub::task::{InMemoryTaskStore, TaskStore};
use std::sync::Arc;
use test_helpers::*;
use wiremock::MockServer;

async fn service_for(config: &medhub::config::HubConfig) -> (HubService, Arc<InMemoryTaskStore>) {
    let store = Arc::new(InMemoryTaskStore::new());
    let service = HubService::from_config(config, store.clone()).unwrap();
    (service, store)
}

#[tokio::test]
async fn test_hypertension_query_routes_to_medgemma_and_completes() {
    let llm = MockServer::start().await;
    let medgemma = MockServer::start().await;
    let clinical = MockServer::start().await;

    mount_llm_routing(&llm, "medgemma", "symptom question").await;
    mount_agent_card(&medgemma, agent_card("MedGemma Medical Assistant")).await;
    mount_stream(
        &medgemma,
        sse_body(&[
            status_event("working", Some("Processing your medical question..."), false),
            artifact_event(
                "medical_response",
                "Common symptoms include headaches, shortness of breath, and nosebleeds.",
            ),
            status_event("completed", None, true),
        ]),
    )
    .await;

    let config = hub_config(&llm.uri(), &medgemma.uri(), &clinical.uri());
    let (service, store) = service_for(&config).await;

    let outcome = service
        .route("What are common symptoms of hypertension?", None, None)
        .await
        .unwrap();

    assert_eq!(outcome.state, TaskState::Completed);
    assert!(outcome.response.contains("Common symptoms include"));

    let task = store.get(&outcome.task_id).await.unwrap();
    assert_eq!(task.artifacts.len(), 1);
    assert_eq!(task.artifacts[0].name, "medical_response");
}

#[tokio::test]
async fn test_classifier_outage_falls_back_to_default_agent() {
    // No LLM server at all: the classification call fails outright
    let medgemma = MockServer::start().await;
    let clinical = MockServer::start().await;

    mount_agent_card(&medgemma, agent_card("MedGemma Medical Assistant")).await;
    mount_stream(
        &medgemma,
        sse_body(&[
            artifact_event("medical_response", "Default-routed answer."),
            status_event("completed", None, true),
        ]),
    )
    .await;

    let config = hub_config("http://127.0.0.1:9", &medgemma.uri(), &clinical.uri());
    let (service, _) = service_for(&config).await;

    let outcome = service.route("anything at all", None, None).await.unwrap();

    // The task still terminates, routed to the default agent
    assert_eq!(outcome.state, TaskState::Completed);
    assert!(outcome.response.contains("Default-routed answer."));
}

#[tokio::test]
async fn test_unknown_agent_name_uses_default_without_error() {
    let llm = MockServer::start().await;
    let medgemma = MockServer::start().await;
    let clinical = MockServer::start().await;

    mount_llm_routing(&llm, "unknown_agent", "hallucinated specialist").await;
    mount_agent_card(&medgemma, agent_card("MedGemma Medical Assistant")).await;
    mount_stream(
        &medgemma,
        sse_body(&[
            artifact_event("medical_response", "Handled by the default specialist."),
            status_event("completed", None, true),
        ]),
    )
    .await;

    let config = hub_config(&llm.uri(), &medgemma.uri(), &clinical.uri());
    let (service, _) = service_for(&config).await;

    let outcome = service.route("a question", None, None).await.unwrap();

    assert_eq!(outcome.state, TaskState::Completed);
    assert!(outcome.response.contains("default specialist"));
}

#[tokio::test]
async fn test_unparseable_routing_decision_uses_default() {
    let llm = MockServer::start().await;
    let medgemma = MockServer::start().await;
    let clinical = MockServer::start().await;

    // The original fallback text for a dead orchestrator
    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .and(wiremock::matchers::path("/v1/chat/completions"))
        .respond_with(
            wiremock::ResponseTemplate::new(200)
                .set_body_json(completion_with_content("Error analyzing query")),
        )
        .mount(&llm)
        .await;

    mount_agent_card(&medgemma, agent_card("MedGemma Medical Assistant")).await;
    mount_stream(
        &medgemma,
        sse_body(&[
            artifact_event("medical_response", "answer"),
            status_event("completed", None, true),
        ]),
    )
    .await;

    let config = hub_config(&llm.uri(), &medgemma.uri(), &clinical.uri());
    let (service, _) = service_for(&config).await;

    let outcome = service.route("a question", None, None).await.unwrap();
    assert_eq!(outcome.state, TaskState::Completed);
}

#[tokio::test]
async fn test_clinical_routing_reaches_second_agent() {
    let llm = MockServer::start().await;
    let medgemma = MockServer::start().await;
    let clinical = MockServer::start().await;

    mount_llm_routing(&llm, "clinical", "research question").await;
    mount_agent_card(&clinical, agent_card("Clinical Research Agent")).await;
    mount_stream(
        &clinical,
        sse_body(&[
            artifact_event("clinical_response", "Trial evidence summary."),
            status_event("completed", None, true),
        ]),
    )
    .await;

    let config = hub_config(&llm.uri(), &medgemma.uri(), &clinical.uri());
    let (service, _) = service_for(&config).await;

    let outcome = service
        .route("Summarize recent hypertension trials", None, None)
        .await
        .unwrap();

    assert_eq!(outcome.state, TaskState::Completed);
    assert!(outcome.response.contains("Trial evidence summary."));
}

#[tokio::test]
async fn test_concurrent_queries_share_no_task_state() {
    let llm = MockServer::start().await;
    let medgemma = MockServer::start().await;
    let clinical = MockServer::start().await;

    mount_llm_routing(&llm, "medgemma", "symptoms").await;
    mount_agent_card(&medgemma, agent_card("MedGemma Medical Assistant")).await;
    mount_stream(
        &medgemma,
        sse_body(&[
            artifact_event("medical_response", "shared-connection answer"),
            status_event("completed", None, true),
        ]),
    )
    .await;

    let config = hub_config(&llm.uri(), &medgemma.uri(), &clinical.uri());
    let (service, store) = service_for(&config).await;
    let service = Arc::new(service);

    let outcomes = futures::future::join_all((0..4).map(|i| {
        let service = service.clone();
        async move {
            service
                .route(&format!("question {i}"), None, None)
                .await
                .unwrap()
        }
    }))
    .await;

    // Every query got its own task with its own single artifact
    let mut task_ids = std::collections::HashSet::new();
    for outcome in outcomes {
        assert_eq!(outcome.state, TaskState::Completed);
        let task = store.get(&outcome.task_id).await.unwrap();
        assert_eq!(task.artifacts.len(), 1);
        assert!(task_ids.insert(outcome.task_id));
    }
    assert_eq!(task_ids.len(), 4);
}

#[tokio::test]
async fn test_react_mode_skips_remote_agents_entirely() {
    // No mock endpoints: the multi-step strategy must not touch the network
    let config = hub_config("http://127.0.0.1:9", "http://127.0.0.1:9", "http://127.0.0.1:9");
    let (service, store) = service_for(&config).await;

    let outcome = service
        .route("Plan a research review", None, Some("react".to_string()))
        .await
        .unwrap();

    assert_eq!(outcome.state, TaskState::Completed);
    assert!(outcome.response.contains("Plan a research review"));

    let task = store.get(&outcome.task_id).await.unwrap();
    assert_eq!(task.artifacts[0].name, "react_final_response");
}
