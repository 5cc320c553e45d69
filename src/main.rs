use std::process::ExitCode;

use alphascan::bootstrap::{init_tracing, run};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    if let Err(e) = run().await {
        tracing::error!("Revenue analysis failed: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}
