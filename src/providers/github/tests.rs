use mockito::{Matcher, Server};

use super::provider::parse_repository_path;
use super::GitHubProvider;
use crate::auth::Token;
use crate::error::PipescopeError;
use crate::pipeline::PipelineState;
use crate::providers::Provider;

const SHA: &str = "23ebbb3b14c9a026199474d2931bdc55863dfffc";
const RUNS_PATH: &str = "/repos/gregfurman/pipescope/actions/runs";

fn run_json(status: &str, conclusion: Option<&str>) -> String {
    let conclusion = conclusion.map_or("null".to_string(), |c| format!("\"{c}\""));
    format!(
        r#"{{
            "id": 8858984663,
            "head_branch": "test-workflow",
            "head_sha": "{SHA}",
            "event": "push",
            "status": "{status}",
            "conclusion": {conclusion},
            "workflow_id": 95717003,
            "html_url": "https://github.com/gregfurman/pipescope/actions/runs/8858984663",
            "created_at": "2024-04-26T18:01:43Z",
            "repository": {{
                "id": 791402015,
                "full_name": "gregfurman/pipescope"
            }}
        }}"#
    )
}

fn provider(server: &Server) -> GitHubProvider {
    GitHubProvider::new(&server.url(), None).unwrap()
}

#[test]
fn test_parse_repository_path_variants() {
    let expected = ("owner".to_string(), "repo".to_string());

    assert_eq!(parse_repository_path("git@github.com:owner/repo.git").unwrap(), expected);
    assert_eq!(parse_repository_path("owner/repo").unwrap(), expected);
    assert_eq!(parse_repository_path("https://github.com/owner/repo.git").unwrap(), expected);
    assert_eq!(parse_repository_path("https://github.com/owner/repo/").unwrap(), expected);
    assert_eq!(parse_repository_path("ssh://git@github.com/owner/repo.git").unwrap(), expected);
}

#[test]
fn test_parse_repository_path_enterprise_remotes() {
    let expected = ("owner".to_string(), "repo".to_string());

    assert_eq!(
        parse_repository_path("git@github.example.com:owner/repo.git").unwrap(),
        expected
    );
    assert_eq!(
        parse_repository_path("https://github.example.com/owner/repo.git").unwrap(),
        expected
    );
}

#[test]
fn test_parse_repository_path_splits_on_first_slash() {
    let (owner, repo) = parse_repository_path("owner/repo/extra").unwrap();
    assert_eq!(owner, "owner");
    assert_eq!(repo, "repo/extra");
}

#[test]
fn test_parse_repository_path_rejects_missing_slash() {
    let err = parse_repository_path("incorrect path format").unwrap_err();
    assert!(matches!(err, PipescopeError::InvalidRepositoryPath(_)));

    let err = parse_repository_path("git@github.com:repo.git").unwrap_err();
    assert!(matches!(err, PipescopeError::InvalidRepositoryPath(_)));
}

#[tokio::test]
async fn test_resolve_project_id() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/owner/repo")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":12345}"#)
        .create_async()
        .await;

    let id = provider(&server).resolve_project_id("owner/repo").await.unwrap();

    assert_eq!(id, "12345");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_resolve_project_id_fails_on_malformed_path() {
    let server = Server::new_async().await;

    let err = provider(&server)
        .resolve_project_id("incorrect path format")
        .await
        .unwrap_err();

    assert!(matches!(err, PipescopeError::InvalidRepositoryPath(_)));
}

#[tokio::test]
async fn test_pipeline_by_sha_returns_in_progress_run() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", RUNS_PATH)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("head_sha".into(), SHA.into()),
            Matcher::UrlEncoded("page".into(), "1".into()),
            Matcher::UrlEncoded("per_page".into(), "1".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(
            r#"{{"total_count":1, "workflow_runs": [{}]}}"#,
            run_json("in_progress", None)
        ))
        .create_async()
        .await;

    let pipeline = provider(&server)
        .pipeline_by_sha("https://github.com/gregfurman/pipescope", SHA)
        .await
        .unwrap();

    assert_eq!(pipeline.id, 8858984663);
    assert_eq!(pipeline.project_id, "gregfurman/pipescope");
    assert_eq!(pipeline.commit_sha, SHA);
    assert_eq!(pipeline.status, "in_progress");
    assert_eq!(
        pipeline.url,
        "https://github.com/gregfurman/pipescope/actions/runs/8858984663"
    );
    assert!(pipeline.created_at.is_some());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_pipeline_by_sha_collapses_conclusion() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", RUNS_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(
            r#"{{"total_count":1, "workflow_runs": [{}]}}"#,
            run_json("completed", Some("failure"))
        ))
        .create_async()
        .await;

    let pipeline = provider(&server)
        .pipeline_by_sha("git@github.com:gregfurman/pipescope.git", SHA)
        .await
        .unwrap();

    assert_eq!(pipeline.status, "failure");
}

#[tokio::test]
async fn test_pipeline_by_sha_without_runs_is_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", RUNS_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"total_count":0, "workflow_runs": []}"#)
        .create_async()
        .await;

    let err = provider(&server)
        .pipeline_by_sha("gregfurman/pipescope", SHA)
        .await
        .unwrap_err();

    assert!(matches!(err, PipescopeError::PipelineNotFound { .. }));
}

#[tokio::test]
async fn test_pipeline_by_id() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/repos/gregfurman/pipescope/actions/runs/8858984663")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(run_json("completed", Some("success")))
        .create_async()
        .await;

    let pipeline = provider(&server)
        .pipeline("gregfurman/pipescope", 8858984663)
        .await
        .unwrap();

    assert_eq!(pipeline.id, 8858984663);
    assert_eq!(pipeline.status, "success");
}

#[tokio::test]
async fn test_pipeline_by_id_rejects_empty_body() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/repos/gregfurman/pipescope/actions/runs/8858984663")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{}")
        .create_async()
        .await;

    let result = provider(&server)
        .pipeline("gregfurman/pipescope", 8858984663)
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_upstream_error_status_is_reported() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/repos/gregfurman/pipescope/actions/runs/1")
        .with_status(404)
        .with_body(r#"{"message":"Not Found"}"#)
        .create_async()
        .await;

    let err = provider(&server)
        .pipeline("gregfurman/pipescope", 1)
        .await
        .unwrap_err();

    assert!(matches!(err, PipescopeError::PipelineFetch { .. }));
    assert!(matches!(err.root(), PipescopeError::Api { status: 404, .. }));
}

#[tokio::test]
async fn test_token_is_sent_as_bearer() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/owner/repo")
        .match_header("authorization", "Bearer ghp_test")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":1}"#)
        .create_async()
        .await;

    let provider = GitHubProvider::new(&server.url(), Some(Token::from("ghp_test"))).unwrap();
    provider.resolve_project_id("owner/repo").await.unwrap();

    mock.assert_async().await;
}

#[test]
fn test_pending_classification() {
    let provider = GitHubProvider::new("https://api.github.com", None).unwrap();

    assert!(provider.is_pending("queued"));
    assert!(provider.is_pending("in_progress"));
    for terminal in ["success", "failure", "cancelled", "skipped", "timed_out", "neutral"] {
        assert!(!provider.is_pending(terminal), "{terminal}");
    }
}

#[test]
fn test_state_normalization() {
    let provider = GitHubProvider::new("https://api.github.com", None).unwrap();

    assert_eq!(provider.state("in_progress"), PipelineState::Pending);
    assert_eq!(provider.state("success"), PipelineState::Succeeded);
    assert_eq!(provider.state("failure"), PipelineState::Failed);
    assert_eq!(provider.state("timed_out"), PipelineState::Failed);
    assert_eq!(provider.state("cancelled"), PipelineState::Canceled);
    assert_eq!(
        provider.state("skipped"),
        PipelineState::Unknown("skipped".to_string())
    );
}
