//! Typed operations against a scripted backend over TCP

use sage_types::{
    AnalysisDepth, IssueKind, SuggestionCategory, SuggestionPriority,
};
use serde_json::{Value, json};

use crate::common::{FakeBackend, failure, ok};

fn python_backend() -> impl Fn(&str, &str, &serde_json::Map<String, Value>) -> Option<Value> {
    |target, command, payload| {
        let reply = match (target, command) {
            ("system", "health_check") => ok(json!({})),
            ("system", "get_status") => ok(json!({
                "status": { "components": { "python_intelligence": "ready" }, "uptime": 31 }
            })),
            ("python_intelligence", "analyze_file") => ok(json!({
                "language": "python",
                "elements": [
                    { "name": "handle", "type": "function", "line": 4, "complexity": 18, "is_public": true },
                    { "name": "_cache", "type": "function", "line": 40, "complexity": 1 },
                    { "name": "Service", "type": "class", "line": 60, "docstring": "A service." }
                ],
                "errors": ["invalid syntax"],
                "warnings": ["line 12: unused variable 'x'", "shadowed builtin"],
                "metrics": { "lines_of_code": 120, "average_complexity": 6.3, "maintainability_index": 58.0 }
            })),
            ("python_intelligence", "analyze_codebase") => ok(json!({
                "total_files": 3,
                "total_lines": 410.0,
                "languages": { "python": 3 },
                "recommendations": ["Increase test coverage"]
            })),
            ("python_intelligence", "get_code_metrics") => ok(json!({
                "average_complexity": 5.0,
                "maintainability_index": 70.0,
                "technical_debt_ratio": 0.25,
                "test_coverage": 0.4
            })),
            ("python_intelligence", "find_similar_code") => ok(json!({
                "results": [
                    { "file_path": "svc/a.py", "line": 10, "similarity": 0.81, "code": "def handle(): ..." }
                ],
                "limit_seen": payload.get("limit").cloned()
            })),
            ("git_semantic", "generate_commit") => ok(json!({
                "commit": {
                    "type": "feat",
                    "scope": "",
                    "breaking_change": true,
                    "description": "add streaming endpoint",
                    "body": "Streams results as they arrive.",
                    "footer": "BREAKING CHANGE: old endpoint removed"
                },
                "confidence": 0.75,
                "files_changed": ["api.py", "server.py"]
            })),
            ("llm_provider", "generate") => ok(json!({ "response": "It caches lookups." })),
            _ => failure("unsupported command"),
        };
        Some(reply)
    }
}

#[tokio::test]
async fn analyze_file_end_to_end() {
    let backend = FakeBackend::start(python_backend()).await;
    let client = backend.client();
    client.connect().await.unwrap();

    let analysis = client
        .analyze_file("svc/handler.py", AnalysisDepth::Quick)
        .await
        .expect("analysis");

    assert_eq!(analysis.file_path, "svc/handler.py");
    assert_eq!(analysis.elements.len(), 3);
    assert!(!analysis.elements[1].is_public);
    let lines: Vec<u32> = analysis.issues.iter().map(|i| i.line).collect();
    assert_eq!(lines, vec![1, 12, 1]);
    assert_eq!(analysis.issues[0].kind, IssueKind::SyntaxError);
    assert_eq!(analysis.error_count(), 1);
    assert_eq!(
        analysis.suggestions,
        vec![
            "Add docstrings to 1 public functions",
            "Consider refactoring 1 complex functions",
        ]
    );

    let sent = &backend.requests()[1];
    assert_eq!(sent.target, "python_intelligence");
    assert_eq!(sent.payload["depth"], "quick");
}

#[tokio::test]
async fn suggestions_end_to_end() {
    let backend = FakeBackend::start(python_backend()).await;
    let client = backend.client();
    client.connect().await.unwrap();

    let suggestions = client
        .file_suggestions("svc/handler.py", AnalysisDepth::Standard)
        .await;

    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions[0].category, SuggestionCategory::Documentation);
    assert_eq!(suggestions[0].priority, SuggestionPriority::Low);
    assert_eq!(suggestions[1].category, SuggestionCategory::Refactor);
    assert_eq!(suggestions[1].priority, SuggestionPriority::Medium);
    assert!(suggestions.iter().all(|s| s.title.chars().count() <= 50));
}

#[tokio::test]
async fn project_commit_question_similar_status() {
    let backend = FakeBackend::start(python_backend()).await;
    let client = backend.client();
    client.connect().await.unwrap();

    let project = client.analyze_project("/work/svc").await.expect("project");
    assert_eq!(project.total_lines, 410);
    assert_eq!(project.metrics.test_coverage, Some(0.4));
    assert_eq!(project.recommendations, vec!["Increase test coverage"]);

    let commit = client.generate_commit(None).await.expect("commit");
    assert_eq!(
        commit.message,
        "feat!: add streaming endpoint\n\nStreams results as they arrive.\n\nBREAKING CHANGE: old endpoint removed"
    );
    assert_eq!(commit.files_changed.len(), 2);

    let answer = client.ask_question("What does handle do?", None).await;
    assert_eq!(answer.as_deref(), Some("It caches lookups."));

    let similar = client.search_similar_code("def handle(): ...", 5).await;
    assert_eq!(similar.len(), 1);
    assert_eq!(similar[0].snippet, "def handle(): ...");

    let status = client.get_system_status().await;
    assert_eq!(status["uptime"], 31);

    assert_eq!(
        backend.commands(),
        vec![
            "health_check",
            "analyze_codebase",
            "get_code_metrics",
            "generate_commit",
            "generate",
            "find_similar_code",
            "get_status",
        ]
    );
    let commit_request = &backend.requests()[3];
    assert_eq!(commit_request.payload["staged_only"], true);
    assert!(commit_request.payload.get("repository_path").is_none());
}

#[tokio::test]
async fn backend_errors_degrade_without_disconnecting() {
    let backend = FakeBackend::start(|_, command, _| match command {
        "health_check" => Some(ok(json!({}))),
        _ => Some(failure("backend busy")),
    })
    .await;
    let client = backend.client();
    client.connect().await.unwrap();

    assert!(client.analyze_file("a.py", AnalysisDepth::Deep).await.is_none());
    assert!(client.generate_commit(Some("/repo")).await.is_none());
    assert!(client.search_similar_code("x", 1).await.is_empty());
    assert!(client.get_system_status().await.is_empty());

    assert!(client.health_check().await);
    assert_eq!(
        client
            .call("system", "anything", serde_json::Map::new())
            .await
            .unwrap_err()
            .to_string(),
        "backend busy"
    );
}
