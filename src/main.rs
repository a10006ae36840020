use clap::Parser;
use race_elo_processor::{args::Args, database::db::DbClient, error::ProcessorError, model::process_scope};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(&args).await {
        Ok(written) => {
            println!(
                "Elo calculation for '{}' completed. Rating records written: {}",
                args.scope, written
            );
        }
        Err(e) => {
            error!("Batch run for scope '{}' failed: {}", args.scope, e);
            std::process::exit(1);
        }
    }
}

async fn run(args: &Args) -> Result<u64, ProcessorError> {
    let client = DbClient::connect(&args.connection_string).await?;

    process_scope(&client, args.scope).await
}
