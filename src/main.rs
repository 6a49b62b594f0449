// src/main.rs

use kimi_run::types::EXIT_INTERNAL_ERROR;
use kimi_run::{cli, logging, report, run};

#[tokio::main]
async fn main() {
    let code = match run_main().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("[ERROR] kimi-run: {err:?}");
            // Callers parse stdout for the frame even on failure.
            if let Err(e) = report::write_framed(&mut std::io::stdout().lock(), "") {
                eprintln!("[ERROR] kimi-run: writing framed output: {e}");
            }
            EXIT_INTERNAL_ERROR
        }
    };
    std::process::exit(code);
}

async fn run_main() -> anyhow::Result<i32> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
