use anyhow::{Context as AnyhowContext, Result};
use axum::{
    body::Body,
    extract::{rejection::QueryRejection, Query},
    http::{Response as HttpResponse, StatusCode, Uri},
    response::Response,
    routing::get,
    Router,
};
use clap::{Args, Parser, Subcommand};
use session_indexer::{
    render_markdown, DiskLister, DiskWriter, NameRegistry, SnapshotWriter, TreeBuilder,
    TreeService,
};
use session_protocol::{serialize_json, RootCategory};
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod http_api;
mod server_security;
mod static_files;

const REGISTRY_ENV: &str = "SESSION_MAP_REGISTRY";
const DATA_ROOT_ENV: &str = "SESSION_MAP_DATA_ROOT";
const DEFAULT_REGISTRY: &str = "config/names.json";
const DEFAULT_DATA_ROOT: &str = "data";

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "session-map")]
#[command(about = "Browse recorded sessions as a mind-map outline", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Name registry JSON (env: SESSION_MAP_REGISTRY, default: config/names.json)
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    /// Root of the session directories (env: SESSION_MAP_DATA_ROOT, default: data)
    #[arg(long, global = true)]
    data_root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the tree API and the browser client over HTTP
    Serve(ServeArgs),

    /// Build the tree once and print it
    Tree(TreeArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Bind address, e.g. 127.0.0.1:7700
    #[arg(long, default_value = "127.0.0.1:7700")]
    bind: String,

    /// Allow binding to non-loopback addresses
    #[arg(long)]
    public: bool,

    /// Directory with the browser client; snapshots are written below it
    #[arg(long, default_value = "static")]
    static_root: PathBuf,

    /// Snapshot directory, relative to --static-root
    #[arg(long, default_value = "history")]
    history_dir: PathBuf,

    /// Base name embedded in snapshot file names
    #[arg(long, default_value = "session_map")]
    snapshot_name: String,
}

#[derive(Args)]
struct TreeArgs {
    /// Top level of the tree: user|activity
    #[arg(long, default_value = "user")]
    by: RootCategory,

    /// Print the tree as JSON instead of Markdown
    #[arg(long)]
    json: bool,

    /// Also write a timestamped Markdown snapshot into this directory
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Base name embedded in snapshot file names
    #[arg(long, default_value = "session_map")]
    snapshot_name: String,
}

/// Settings shared by every subcommand, resolved once at startup.
struct Settings {
    registry: Arc<NameRegistry>,
    data_root: PathBuf,
}

impl Settings {
    fn resolve(cli: &Cli) -> Result<Self> {
        let registry_path = resolve_path(cli.registry.as_deref(), REGISTRY_ENV, DEFAULT_REGISTRY);
        let data_root = resolve_path(cli.data_root.as_deref(), DATA_ROOT_ENV, DEFAULT_DATA_ROOT);

        let registry = NameRegistry::load(&registry_path).with_context(|| {
            format!("Failed to load name registry: {}", registry_path.display())
        })?;

        Ok(Self {
            registry: Arc::new(registry),
            data_root,
        })
    }

    fn builder(&self) -> TreeBuilder {
        TreeBuilder::new(
            self.registry.clone(),
            Arc::new(DiskLister),
            self.data_root.clone(),
        )
    }
}

fn resolve_path(flag: Option<&Path>, env_key: &str, default: &str) -> PathBuf {
    flag.map(Path::to_path_buf)
        .or_else(|| env::var_os(env_key).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(default))
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON output
    if matches!(&cli.command, Commands::Tree(args) if args.json) {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let settings = Settings::resolve(&cli)?;

    match cli.command {
        Commands::Serve(args) => serve_http(args, settings).await?,
        Commands::Tree(args) => run_tree(args, settings)?,
    }

    Ok(())
}

fn run_tree(args: TreeArgs, settings: Settings) -> Result<()> {
    let tree = settings
        .builder()
        .build(args.by)
        .with_context(|| format!("Failed to build tree by {}", args.by))?;
    let markdown = render_markdown(&tree);

    if let Some(dir) = &args.snapshot_dir {
        let path = SnapshotWriter::new(dir, Arc::new(DiskWriter))
            .write(&markdown, &args.snapshot_name, args.by)
            .with_context(|| format!("Failed to write snapshot into {}", dir.display()))?;
        log::info!("Snapshot saved to {}", path.display());
    }

    if args.json {
        print_stdout(&serialize_json(&tree)?)
    } else {
        print_stdout(markdown.trim_end_matches('\n'))
    }
}

async fn serve_http(args: ServeArgs, settings: Settings) -> Result<()> {
    let target = server_security::BindTarget::resolve(&args.bind, args.public).await?;

    let history = args.static_root.join(&args.history_dir);
    let service = TreeService::new(
        settings.builder(),
        SnapshotWriter::new(&history, Arc::new(DiskWriter)),
        args.snapshot_name.clone(),
    );
    let state = Arc::new(HttpState {
        service: Arc::new(service),
        static_root: args.static_root.clone(),
    });

    let app = Router::new()
        .route(
            "/get-tree",
            get({
                let state = state.clone();
                move |query| http_get_tree(query, state.clone())
            }),
        )
        .route(
            "/health",
            get({
                let state = state.clone();
                move || http_health(state.clone())
            }),
        )
        .fallback(get({
            let state = state.clone();
            move |uri| http_static(uri, state.clone())
        }));

    let listener = tokio::net::TcpListener::bind(target.addrs()).await?;
    let local_addr = listener.local_addr()?;
    let base_url = format!("http://{local_addr}");

    print_stdout(&format!("Serving session tree: {base_url}/get-tree"))?;
    print_stdout(&format!("Browser client: {base_url}/"))?;
    print_stdout(&format!("Snapshots: {}", history.display()))?;
    if target.is_exposed() {
        print_stdout(&format!(
            "Public bind enabled (--public): {}",
            target.describe()
        ))?;
    }
    print_stdout(&format!(
        "Try: curl '{base_url}/get-tree?startingClassName=activity'"
    ))?;

    axum::serve(listener, app).await?;
    Ok(())
}

async fn http_get_tree(
    query: Result<Query<http_api::TreeQuery>, QueryRejection>,
    state: Arc<HttpState>,
) -> Result<Response, StatusCode> {
    let (status, response) = http_api::tree_request(state.service.clone(), query).await;
    http_api::build_response(status, &response)
}

async fn http_health(state: Arc<HttpState>) -> Result<Response, StatusCode> {
    let bytes = serde_json::to_vec(&http_api::health_report(&state.service))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    HttpResponse::builder()
        .status(StatusCode::OK)
        .header("content-type", "application/json")
        .body(Body::from(bytes))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

async fn http_static(uri: Uri, state: Arc<HttpState>) -> Result<Response, StatusCode> {
    static_files::serve(&state.static_root, &uri).await
}

struct HttpState {
    service: Arc<TreeService>,
    static_root: PathBuf,
}
