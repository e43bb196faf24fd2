use clap::Parser;
use synthetic_data_service::cli::{Cli, CliRunner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = Cli::parse();
    let runner = CliRunner::new(&args)?;
    runner.run(&args).await
}
