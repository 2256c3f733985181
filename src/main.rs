#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = kiemtra::run().await {
        eprintln!("kiemtra fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
