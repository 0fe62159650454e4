use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let source = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("QUESTIONS_SOURCE").ok())
        .unwrap_or_else(|| "questions.json".to_string());

    match quiz_session::check_questions(&source, 0, Duration::from_secs(20)).await {
        Ok(count) => {
            println!("{source}: {count} questions");
            Ok(())
        }
        Err(e) => {
            eprintln!("check-questions: {e:#}");
            std::process::exit(1);
        }
    }
}
