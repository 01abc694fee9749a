use std::time::Duration;

use riskwatch_research::runner::{BatchRunner, ANSWER_DELIMITER};
use riskwatch_research::testing::{well_formed_answer, MockResearcher};

fn batch(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[tokio::test]
async fn failure_on_second_entity_is_isolated() {
    let first = well_formed_answer("Alpha", [1, 2, 3, 4]);
    let third = well_formed_answer("Gamma", [4, 3, 2, 1]);
    let researcher = MockResearcher::new()
        .on_entity("Alpha", first.clone())
        .fail_entity("Beta", "Gemini API error (500): backend unavailable")
        .on_entity("Gamma", third.clone());

    let run = BatchRunner::new(&researcher, Duration::ZERO)
        .run(&batch(&["Alpha", "Beta", "Gamma"]))
        .await;

    assert_eq!(run.outcome.succeeded, vec!["Alpha", "Gamma"]);
    assert_eq!(run.outcome.failed_names(), vec!["Beta"]);
    assert!(run.outcome.failed[0].error.contains("500"));
    assert_eq!(
        run.raw.as_str(),
        format!("{first}{ANSWER_DELIMITER}{third}{ANSWER_DELIMITER}")
    );
    assert_eq!(researcher.calls(), vec!["Alpha", "Beta", "Gamma"]);
}

#[tokio::test]
async fn every_failure_still_returns_normally() {
    let researcher = MockResearcher::new()
        .time_out("Alpha", Duration::from_secs(120))
        .fail_entity("Beta", "quota exceeded");

    let run = BatchRunner::new(&researcher, Duration::ZERO)
        .run(&batch(&["Alpha", "Beta"]))
        .await;

    assert!(run.outcome.nothing_succeeded());
    assert_eq!(run.outcome.attempted(), 2);
    assert!(run.raw.is_empty());
    assert!(run.attempts.iter().all(|a| a.result.is_err()));
    assert!(run.outcome.failed[0].error.contains("timed out"));
}

#[tokio::test(start_paused = true)]
async fn pauses_between_entities_but_not_after_last() {
    let researcher = MockResearcher::new()
        .on_entity("Alpha", "a".repeat(60))
        .fail_entity("Beta", "boom")
        .on_entity("Gamma", "c".repeat(60));

    let started = tokio::time::Instant::now();
    BatchRunner::new(&researcher, Duration::from_secs(10))
        .run(&batch(&["Alpha", "Beta", "Gamma"]))
        .await;

    // Two pauses for three entities, including the one after the failure.
    assert_eq!(started.elapsed(), Duration::from_secs(20));
}

#[tokio::test]
async fn empty_batch_is_a_no_op() {
    let researcher = MockResearcher::new();
    let run = BatchRunner::new(&researcher, Duration::from_secs(10)).run(&[]).await;
    assert_eq!(run.outcome.attempted(), 0);
    assert!(run.raw.is_empty());
    assert!(researcher.calls().is_empty());
}
