use clap::{ArgGroup, Parser};
use dev_ready::utils::{logger, validation::Validate};
use dev_ready::{AssetsManifest, DevConfig, DevReadyBroadcaster, DevReadyError, ServerBuild};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "dev-ready")]
#[command(about = "Tell the dev server that a new server build is loaded")]
#[command(group(ArgGroup::new("build").required(true).args(["manifest", "build_hash"])))]
struct Args {
    /// Dev server base URL (defaults to $DEV_HTTP_ORIGIN)
    #[arg(long)]
    origin: Option<String>,

    /// Assets manifest JSON written by the build
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Build hash to announce, instead of reading a manifest
    #[arg(long)]
    build_hash: Option<String>,

    /// Give up on the request after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn load_build(args: &Args) -> Result<ServerBuild, DevReadyError> {
    let assets = match (&args.manifest, &args.build_hash) {
        (Some(path), _) => AssetsManifest::from_file(path)?,
        (None, Some(hash)) => AssetsManifest::new(hash.clone()),
        (None, None) => return Err(DevReadyError::config("no build to announce")),
    };
    Ok(ServerBuild::new(assets))
}

async fn run(args: &Args) -> Result<String, DevReadyError> {
    // 環境變數只在啟動時讀取一次
    let mut config = DevConfig::from_env();
    if let Some(ms) = args.timeout_ms {
        config = config.with_timeout(Duration::from_millis(ms));
    }
    config.validate()?;

    let build = load_build(args)?;
    tracing::debug!("Announcing build {}", build.version());

    let broadcaster = DevReadyBroadcaster::new(config);
    let pending = broadcaster.broadcast(&build, args.origin.as_deref())?;
    let origin = pending.origin().to_string();

    // the runtime stops when main returns, so the ping has to go out first
    pending.wait().await?;
    Ok(origin)
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if args.log_json {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    match run(&args).await {
        Ok(origin) => {
            tracing::info!("📣 Dev server at {} notified", origin);
        }
        Err(e) => {
            tracing::debug!(
                "dev-ready failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }
}
