#[tokio::main]
async fn main() {
    if let Err(e) = caredesk::run().await {
        eprintln!("caredesk: {e}");
        std::process::exit(1);
    }
}
