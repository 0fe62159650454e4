#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = quiz_session::run().await {
        eprintln!("quiz-session fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
