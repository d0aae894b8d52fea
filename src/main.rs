use clap::Parser;
use tracing::error;
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use valorank::{app, args::Args, env::load_env};

#[tokio::main]
async fn main() {
    load_env();
    let args = Args::parse();
    init_tracing(&args.log_level);

    if let Err(e) = app::run(args).await {
        error!(error = %e, "valorank failed");
        std::process::exit(1);
    }
}

fn init_tracing(level: &str) {
    let indicatif_layer = IndicatifLayer::new();
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(indicatif_layer.get_stderr_writer()))
        .with(indicatif_layer)
        .init();
}
