#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = ielts_practice_api::run().await {
        eprintln!("ielts-practice-api fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
