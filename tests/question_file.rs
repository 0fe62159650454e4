use std::path::PathBuf;
use std::time::Duration;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
}

fn scratch_file(contents: &str) -> anyhow::Result<PathBuf> {
    let path = std::env::temp_dir().join(format!("quiz-questions-{}.json", uuid::Uuid::new_v4()));
    std::fs::write(&path, contents)?;
    Ok(path)
}

#[tokio::test]
async fn bundled_fixture_is_a_valid_question_file() -> anyhow::Result<()> {
    let path = fixture("questions.json");
    let count = quiz_session::check_questions(
        path.to_str().expect("utf-8 path"),
        0,
        Duration::from_secs(5),
    )
    .await?;

    assert_eq!(count, 3);
    Ok(())
}

#[tokio::test]
async fn missing_file_is_rejected() {
    let path = fixture("does-not-exist.json");
    let result = quiz_session::check_questions(
        path.to_str().expect("utf-8 path"),
        0,
        Duration::from_secs(5),
    )
    .await;

    let message = format!("{:#}", result.expect_err("missing file"));
    assert!(message.contains("unreachable"), "{message}");
}

#[tokio::test]
async fn empty_and_duplicate_sources_are_rejected() -> anyhow::Result<()> {
    for contents in ["[]", r#"[{"id": "a"}, {"id": "a"}]"#, r#"{"id": 1}"#] {
        let path = scratch_file(contents)?;
        let result =
            quiz_session::check_questions(path.to_str().expect("utf-8 path"), 0, Duration::from_secs(5))
                .await;
        std::fs::remove_file(&path).ok();
        assert!(result.is_err(), "{contents} should be rejected");
    }
    Ok(())
}
