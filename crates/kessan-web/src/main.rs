use clap::Parser;
use dotenv::dotenv;
use kessan_web::cli::Cli;
use kessan_yahoo::Yahoo;
use std::sync::Arc;
use tracing::{trace, Level};

fn preprocess(trace_level: Level) {
    tracing_subscriber::fmt().with_max_level(trace_level).init();
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    preprocess(cli.trace.into());
    trace!("Command line input recorded: {cli:#?}");

    let yahoo = Yahoo::from_env()?;
    trace!("Yahoo endpoints: {:?}", yahoo.config());

    kessan_web::serve(&cli.host, cli.port, Arc::new(yahoo)).await?;
    Ok(())
}
