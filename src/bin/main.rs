//! Binary entrypoint for the navedit tool

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    if let Err(e) = navedit::cli::run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
