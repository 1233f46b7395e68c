use anyhow::Context;
use bookshelf_kernel::{
    settings::{FilterMode, Settings},
    InitCtx, ModuleRegistry,
};
use clap::Parser;

/// Bookshelf record manager
#[derive(Debug, Parser)]
#[command(name = "bookshelf", version, about)]
struct Cli {
    /// Address to bind, overriding `server.host`
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, overriding `server.port`
    #[arg(long)]
    port: Option<u16>,

    /// List filter semantics: `legacy` or `combined`
    #[arg(long)]
    filter_mode: Option<FilterMode>,
}

impl Cli {
    fn apply(self, settings: &mut Settings) {
        if let Some(host) = self.host {
            settings.server.host = host;
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(filter_mode) = self.filter_mode {
            settings.books.filter_mode = filter_mode;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;
    cli.apply(&mut settings);

    bookshelf_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        filter_mode = ?settings.books.filter_mode,
        "bookshelf bootstrap starting"
    );

    let mut registry = ModuleRegistry::new();
    bookshelf_app::register_all(&mut registry, &settings);

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    tracing::info!("bookshelf bootstrap complete");

    let served = bookshelf_http::start_server(&registry, &settings).await;
    registry.stop_all().await?;
    served
}
