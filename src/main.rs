// src/main.rs

use cmdrelay::{cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("cmdrelay error: {err:?}");
        std::process::exit(1);
    }

    // The stdin reader may still be parked in a blocking read after a
    // shutdown request; exiting here avoids waiting on it.
    std::process::exit(0);
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
