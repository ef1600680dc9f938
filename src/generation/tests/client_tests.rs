//! Submission and polling tests for the generation client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockall::mock;
use rstest::{fixture, rstest};
use serde_json::json;
use tokio::time::Instant;

use crate::generation::{
    adapters::ScriptedGenerationApi,
    domain::{
        GenerationError, GenerationRequest, GenerationResult, JobHandle, PollPolicy, StatusReport,
    },
    ports::GenerationApi,
    services::GenerationClient,
};

mock! {
    pub Api {}

    #[async_trait]
    impl GenerationApi for Api {
        async fn submit(&self, request: &GenerationRequest) -> GenerationResult<JobHandle>;
        async fn status(&self, job: &JobHandle) -> GenerationResult<StatusReport>;
    }
}

fn job(value: &str) -> JobHandle {
    JobHandle::new(value).expect("valid job handle")
}

#[fixture]
fn scripted() -> ScriptedGenerationApi {
    ScriptedGenerationApi::new()
}

fn client_for<A: GenerationApi>(api: A) -> GenerationClient<A> {
    GenerationClient::new(Arc::new(api), PollPolicy::default(), 1)
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn poll_gives_up_after_budget_with_timed_out() {
    let mut api = MockApi::new();
    api.expect_status()
        .times(6)
        .returning(|_| Ok(StatusReport::from_data(json!({"status": 0}))));
    let client = client_for(api);
    let started = Instant::now();

    let result = client.poll_until_done(&job("job-1")).await;

    assert!(matches!(
        result,
        Err(GenerationError::TimedOut { attempts: 6, .. })
    ));
    assert_eq!(started.elapsed(), Duration::from_secs(60));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn poll_waits_before_the_first_check() {
    let mut api = MockApi::new();
    api.expect_status()
        .times(1)
        .returning(|_| {
            Ok(StatusReport::from_data(
                json!({"successFlag": 1, "url": "https://cdn/x.png"}),
            ))
        });
    let client = client_for(api);
    let started = Instant::now();

    let output = client
        .poll_until_done(&job("job-1"))
        .await
        .expect("job should succeed");

    assert_eq!(output.as_str(), "https://cdn/x.png");
    assert_eq!(started.elapsed(), Duration::from_secs(10));
}

#[rstest]
#[case::status_two(2)]
#[case::status_three(3)]
#[tokio::test(start_paused = true)]
async fn poll_stops_on_terminal_failure(scripted: ScriptedGenerationApi, #[case] status: i64) {
    scripted.push_status_data(json!({"status": 0}));
    scripted.push_status_data(json!({"status": status}));
    scripted.push_status_data(json!({"status": 1, "url": "https://cdn/never.png"}));
    let client = client_for(scripted.clone());

    let result = client.poll_until_done(&job("job-2")).await;

    assert!(matches!(
        result,
        Err(GenerationError::JobFailed { status: reported, .. }) if reported == status
    ));
    assert_eq!(scripted.status_checks(), 2);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn poll_reports_missing_output_on_bare_success(scripted: ScriptedGenerationApi) {
    scripted.push_status_data(json!({"status": 1}));
    let client = client_for(scripted.clone());

    let result = client.poll_until_done(&job("job-3")).await;

    assert!(matches!(result, Err(GenerationError::MissingOutput(_))));
    assert_eq!(scripted.status_checks(), 1);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn poll_propagates_status_transport_errors() {
    let mut api = MockApi::new();
    api.expect_status().times(1).returning(|_| {
        Err(GenerationError::transport(std::io::Error::other(
            "connection reset",
        )))
    });
    let client = client_for(api);

    let result = client.poll_until_done(&job("job-4")).await;

    assert!(matches!(result, Err(GenerationError::Transport(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn submit_sends_instruction_and_output_count(scripted: ScriptedGenerationApi) {
    scripted.push_job("job-5");
    let client = GenerationClient::new(Arc::new(scripted.clone()), PollPolicy::default(), 2);

    let handle = client
        .submit("runners at dawn")
        .await
        .expect("submission should succeed");

    assert_eq!(handle.as_str(), "job-5");
    assert_eq!(
        scripted.submitted(),
        vec![GenerationRequest::new("runners at dawn", 2)]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn submit_rejection_is_not_retried() {
    let mut api = MockApi::new();
    api.expect_submit().times(1).returning(|_| {
        Err(GenerationError::SubmissionRejected {
            code: Some(402),
            reason: "insufficient credits".to_owned(),
        })
    });
    api.expect_status().never();
    let client = client_for(api);

    let result = client.generate("runners at dawn").await;

    assert!(matches!(
        result,
        Err(GenerationError::SubmissionRejected { code: Some(402), .. })
    ));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn generate_returns_output_of_finished_job() {
    let api = ScriptedGenerationApi::succeeding("job-6", "https://cdn/done.png");
    let client = client_for(api);

    let output = client
        .generate("swimmers in open water")
        .await
        .expect("generation should succeed");

    assert_eq!(output.as_str(), "https://cdn/done.png");
}
