use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    labbot_cli::run().await
}
