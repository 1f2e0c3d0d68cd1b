use clap::Parser;

use groom_scheduler_lib::config::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    groom_scheduler_lib::init_logging();

    let cli = Cli::parse();
    groom_scheduler_lib::run(cli).await
}
