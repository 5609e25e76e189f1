// src/main.rs

use cronsync::{cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("cronsync error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    let log_handle = logging::init_logging(args.log_level)?;
    run(args, log_handle).await
}
