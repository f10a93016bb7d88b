mod common;

use common::*;
use notigenie_core::NotiError;
use notigenie_core::config::AppConfig;
use notigenie_core::conversation::Turn;
use notigenie_core::llm::{ChatRole, ContentPart, Generation};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const TODAY: &str = "2024-05-01";

#[tokio::test]
async fn test_add_item_creates_page_and_confirms() {
    let llm = MockLanguageModel::new()
        .on_select(|_| Ok(select(&["shopping_list"])))
        .on_synthesize(|_| Ok(Generation::from_calls(vec![call("create", json!({"title": "milk"}))])))
        .on_compose(|request| {
            let responses = function_responses(request);
            assert_eq!(responses.len(), 1);
            assert_eq!(responses[0]["status"], "success");
            assert_eq!(responses[0]["payload"]["id"], PAGE_ID);
            Ok(Generation::from_text("Added milk to your shopping list."))
        });
    let h = harness(llm, RecordingStore::new(), AppConfig::default());

    let reply = h
        .orchestrator
        .handle("s1", "add milk to my shopping list", TODAY)
        .await;

    assert_eq!(reply, "Added milk to your shopping list.");
    assert_eq!(
        h.store.calls(),
        vec![StoreCall::Create {
            database_id: SHOPPING_ID_DASHED.to_string(),
            properties: json!({"Name": {"title": [{"text": {"content": "milk"}}]}})
                .as_object()
                .cloned()
                .unwrap(),
        }]
    );
}

#[tokio::test]
async fn test_checkbox_condition_becomes_equals_predicate() {
    let llm = MockLanguageModel::new()
        .on_select(|_| Ok(select(&["shopping_list"])))
        .on_synthesize(|_| {
            Ok(Generation::from_calls(vec![call(
                "search",
                json!({"filter_conditions": "{\"Done\": false}"}),
            )]))
        });
    let store = RecordingStore::new().with_pages(vec![page(PAGE_ID, "eggs", json!({}))]);
    let h = harness(llm, store, AppConfig::default());

    h.orchestrator.handle("s1", "what is left to buy?", TODAY).await;

    assert_eq!(
        h.store.calls(),
        vec![StoreCall::Query {
            database_id: SHOPPING_ID_DASHED.to_string(),
            filter: Some(json!({"property": "Done", "checkbox": {"equals": false}})),
        }]
    );
    let compose = h.llm.requests(Stage::Compose);
    let responses = function_responses(&compose[0]);
    assert_eq!(responses[0]["payload"]["count"], 1);
    assert_eq!(responses[0]["payload"]["results"][0]["title"], "eggs");
}

#[tokio::test]
async fn test_unregistered_database_is_reported_not_raised() {
    let llm = MockLanguageModel::new()
        .on_select(|_| Ok(select(&["todo_list"])))
        .on_synthesize(|_| {
            Ok(Generation::from_calls(vec![call(
                "create",
                json!({"title": "pasta", "database_name": "recipes"}),
            )]))
        })
        .on_compose(|request| {
            let responses = function_responses(request);
            assert_eq!(responses[0]["status"], "error");
            assert!(
                responses[0]["message"]
                    .as_str()
                    .unwrap()
                    .contains("'recipes' not found")
            );
            Ok(Generation::from_text("Sorry, I could not find a recipes database."))
        });
    let h = harness(llm, RecordingStore::new(), AppConfig::default());

    let reply = h.orchestrator.handle("s1", "save a pasta recipe", TODAY).await;

    assert_eq!(reply, "Sorry, I could not find a recipes database.");
    assert!(h.store.calls().is_empty());
}

#[tokio::test]
async fn test_remote_failure_does_not_abort_sibling_database() {
    let llm = MockLanguageModel::new()
        .on_select(|_| Ok(select(&["shopping_list", "todo_list"])))
        .on_synthesize(|_| Ok(Generation::from_calls(vec![call("search", json!({}))])))
        .on_compose(|request| {
            let responses = function_responses(request);
            assert_eq!(responses.len(), 2);
            let statuses: Vec<&str> = responses
                .iter()
                .map(|r| r["status"].as_str().unwrap())
                .collect();
            assert!(statuses.contains(&"success"));
            assert!(statuses.contains(&"error"));
            let failed = responses.iter().find(|r| r["status"] == "error").unwrap();
            assert_eq!(failed["database_name"], "todo_list");
            assert_eq!(failed["remote_code"], "service_unavailable");
            Ok(Generation::from_text("Your shopping list is empty, but I could not reach your todos."))
        });
    let store = RecordingStore::new().failing_on(TODO_ID_DASHED);
    let h = harness(llm, store, AppConfig::default());

    let reply = h.orchestrator.handle("s1", "what do I have?", TODAY).await;

    assert!(reply.contains("could not reach"));
    assert_eq!(h.store.calls().len(), 2);
    assert_eq!(h.llm.requests(Stage::Synthesize).len(), 2);
}

#[tokio::test]
async fn test_empty_selection_skips_synthesis() {
    let llm = MockLanguageModel::new().on_compose(|request| {
        assert!(function_responses(request).is_empty());
        Ok(Generation::from_text("Hello!"))
    });
    let h = harness(llm, RecordingStore::new(), AppConfig::default());

    let reply = h.orchestrator.handle("s1", "hi there", TODAY).await;

    assert_eq!(reply, "Hello!");
    assert!(h.llm.requests(Stage::Synthesize).is_empty());
    assert!(h.store.calls().is_empty());
}

#[tokio::test]
async fn test_hallucinated_selection_is_ignored() {
    let llm = MockLanguageModel::new().on_select(|_| Ok(select(&["recipes"])));
    let h = harness(llm, RecordingStore::new(), AppConfig::default());

    h.orchestrator.handle("s1", "find a recipe", TODAY).await;

    assert!(h.llm.requests(Stage::Synthesize).is_empty());
    assert_eq!(h.llm.requests(Stage::Compose).len(), 1);
}

#[tokio::test]
async fn test_synthesis_retries_with_error_feedback() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let llm = MockLanguageModel::new()
        .on_select(|_| Ok(select(&["todo_list"])))
        .on_synthesize(move |_| {
            let function_call = if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                call("update", json!({"properties": "{\"Done\": true}"}))
            } else {
                call("update", json!({"id": PAGE_ID, "properties": "{\"Done\": true}"}))
            };
            Ok(Generation::from_calls(vec![function_call]))
        });
    let h = harness(llm, RecordingStore::new(), AppConfig::default());

    h.orchestrator.handle("s1", "mark it done", TODAY).await;

    let synth = h.llm.requests(Stage::Synthesize);
    assert_eq!(synth.len(), 2);
    let turns = &synth[1].contents;
    let rejected = &turns[turns.len() - 2];
    assert_eq!(rejected.role, ChatRole::Model);
    assert!(matches!(&rejected.parts[0], ContentPart::FunctionCall(c) if c.name == "update"));
    let feedback = turns.last().unwrap();
    assert_eq!(feedback.role, ChatRole::User);
    match &feedback.parts[0] {
        ContentPart::Text(text) => assert!(text.contains("could not be used")),
        other => panic!("unexpected part: {other:?}"),
    }
    assert_eq!(
        h.store.calls(),
        vec![StoreCall::Update {
            page_id: PAGE_ID.to_string(),
            properties: json!({"Done": {"checkbox": true}}).as_object().cloned().unwrap(),
        }]
    );
}

#[tokio::test]
async fn test_synthesis_gives_up_after_max_attempts() {
    let llm = MockLanguageModel::new()
        .on_select(|_| Ok(select(&["todo_list"])))
        .on_synthesize(|_| Ok(Generation::from_calls(vec![call("delete", json!({"id": PAGE_ID}))])))
        .on_compose(|request| {
            let responses = function_responses(request);
            assert_eq!(responses.len(), 1);
            assert_eq!(responses[0]["operation"], "delete");
            assert_eq!(responses[0]["status"], "error");
            Ok(Generation::from_text("I could not work out what to change."))
        });
    let mut config = AppConfig::default();
    config.pipeline.synthesis_max_attempts = 3;
    let h = harness(llm, RecordingStore::new(), config);

    let reply = h.orchestrator.handle("s1", "delete everything", TODAY).await;

    assert_eq!(reply, "I could not work out what to change.");
    assert_eq!(h.llm.requests(Stage::Synthesize).len(), 3);
    assert!(h.store.calls().is_empty());
}

#[tokio::test]
async fn test_valid_calls_run_when_a_sibling_stays_malformed() {
    let llm = MockLanguageModel::new()
        .on_select(|_| Ok(select(&["shopping_list"])))
        .on_synthesize(|_| {
            Ok(Generation::from_calls(vec![
                call("create", json!({"title": "milk"})),
                call("update", json!({"properties": "{\"Done\": true}"})),
            ]))
        })
        .on_compose(|request| {
            let responses = function_responses(request);
            assert_eq!(responses.len(), 2);
            assert_eq!(responses[0]["operation"], "create");
            assert_eq!(responses[0]["status"], "success");
            assert_eq!(responses[1]["operation"], "update");
            assert_eq!(responses[1]["status"], "error");
            assert_eq!(responses[1]["database_name"], "shopping_list");
            Ok(Generation::from_text("Added milk, but I could not tick anything off."))
        });
    let h = harness(llm, RecordingStore::new(), AppConfig::default());

    let reply = h
        .orchestrator
        .handle("s1", "add milk and tick off eggs", TODAY)
        .await;

    assert_eq!(reply, "Added milk, but I could not tick anything off.");
    assert_eq!(h.llm.requests(Stage::Synthesize).len(), 2);
    let calls = h.store.calls();
    assert_eq!(calls.len(), 1);
    assert!(matches!(&calls[0], StoreCall::Create { database_id, .. } if database_id == SHOPPING_ID_DASHED));
}

#[tokio::test]
async fn test_unreadable_synthesis_answers_become_synthesize_failure() {
    let llm = MockLanguageModel::new()
        .on_select(|_| Ok(select(&["todo_list"])))
        .on_synthesize(|_| Err(NotiError::parse("function arguments are not JSON")))
        .on_compose(|request| {
            let responses = function_responses(request);
            assert_eq!(responses.len(), 1);
            assert_eq!(responses[0]["operation"], "synthesize");
            assert_eq!(responses[0]["status"], "error");
            Ok(Generation::from_text("Something went wrong."))
        });
    let h = harness(llm, RecordingStore::new(), AppConfig::default());

    let reply = h.orchestrator.handle("s1", "mark it done", TODAY).await;

    assert_eq!(reply, "Something went wrong.");
    assert_eq!(h.llm.requests(Stage::Synthesize).len(), 2);
    assert!(h.store.calls().is_empty());
}

#[tokio::test]
async fn test_selection_failure_yields_apology_and_is_recorded() {
    let llm = MockLanguageModel::new().on_select(|_| Err(NotiError::llm("HTTP 503")));
    let config = AppConfig::default();
    let apology = config.pipeline.apology_reply.clone();
    let h = harness(llm, RecordingStore::new(), config);

    let reply = h.orchestrator.handle("s1", "add milk", TODAY).await;

    assert_eq!(reply, apology);
    let history = h.orchestrator.memory().recent_history("s1").await;
    assert_eq!(history, vec![Turn::user("add milk"), Turn::model(apology)]);
}

#[tokio::test]
async fn test_empty_composition_falls_back() {
    let llm = MockLanguageModel::new().on_compose(|_| Ok(Generation::from_text("   ")));
    let config = AppConfig::default();
    let fallback = config.pipeline.fallback_reply.clone();
    let h = harness(llm, RecordingStore::new(), config);

    assert_eq!(h.orchestrator.handle("s1", "hm", TODAY).await, fallback);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_overrun_replies_and_records() {
    let llm = MockLanguageModel::new().with_delay(Duration::from_secs(10));
    let mut config = AppConfig::default();
    config.pipeline.reply_deadline_secs = Some(3);
    let timeout_reply = config.pipeline.timeout_reply.clone();
    let h = harness(llm, RecordingStore::new(), config);

    let reply = h.orchestrator.handle("s1", "slow request", TODAY).await;

    assert_eq!(reply, timeout_reply);
    let history = h.orchestrator.memory().recent_history("s1").await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[1], Turn::model(timeout_reply));
}

#[tokio::test]
async fn test_history_is_carried_into_next_request() {
    let llm = MockLanguageModel::new().on_compose(|_| Ok(Generation::from_text("Noted.")));
    let h = harness(llm, RecordingStore::new(), AppConfig::default());

    h.orchestrator.handle("s1", "first", TODAY).await;
    h.orchestrator.handle("s1", "second", TODAY).await;

    let selects = h.llm.requests(Stage::Select);
    assert_eq!(selects[0].contents.len(), 1);
    assert_eq!(selects[1].contents.len(), 3);
    assert_eq!(selects[1].contents[1].role, ChatRole::Model);
}

#[tokio::test]
async fn test_research_notes_reach_synthesis() {
    let llm = MockLanguageModel::new()
        .with_research("The museum closes at 17:00")
        .on_select(|_| Ok(select(&["todo_list"])));
    let mut config = AppConfig::default();
    config.pipeline.research = true;
    let h = harness(llm, RecordingStore::new(), config);

    h.orchestrator.handle("s1", "visit the museum tomorrow", TODAY).await;

    let synth = h.llm.requests(Stage::Synthesize);
    assert_eq!(scoped_database(&synth[0]).as_deref(), Some("todo_list"));
    let instruction = synth[0].system_instruction.as_deref().unwrap();
    assert!(instruction.contains("The museum closes at 17:00"));
    assert!(instruction.contains(TODAY));
}
