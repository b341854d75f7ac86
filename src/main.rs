use clap::Parser;

use arbhound::cli::{self, Cli};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(e) = cli::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
