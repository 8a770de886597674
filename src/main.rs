use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use minireq_auth::{NoLoginProvider, StaticLoginProvider};
use minireq_client::{ApiClient, Envelope, Method, RequestOptions, UploadOptions};
use minireq_config::{Config, ConfigWatcher, LogConfig};
use minireq_store::SqliteStorage;
use minireq_transport::{HttpTransport, build_http_client};
use minireq_types::LoginProvider;
use std::{path::PathBuf, sync::Arc};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt::writer::BoxMakeWriter};

#[derive(Parser, Debug)]
#[command(name = "minireq", about = "Authenticated requests against a mini-program backend")]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// SQLite session database path (default: ~/.minireq/session.db).
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,
    /// Login code used if the session has to be refreshed during the command.
    #[arg(long, global = true, value_name = "CODE")]
    login_code: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send a GET request.
    Get(RequestArgs),
    /// Send a POST request.
    Post(RequestArgs),
    /// Send a PUT request.
    Put(RequestArgs),
    /// Send a DELETE request.
    Delete(RequestArgs),
    /// Upload a file as multipart form data.
    Upload {
        /// Upload endpoint (relative to the base URL or absolute).
        url: String,
        /// Local file to upload.
        file: PathBuf,
        /// Form field name for the file.
        #[arg(long, default_value = "image")]
        name: String,
        /// Extra form field, `KEY=VALUE` (repeatable).
        #[arg(long = "form", value_name = "KEY=VALUE")]
        form: Vec<String>,
        /// Extra header, `NAME:VALUE` (repeatable).
        #[arg(short = 'H', long = "header", value_name = "NAME:VALUE")]
        headers: Vec<String>,
    },
    /// Exchange a login code for a session token.
    Login {
        /// One-time code from the login provider.
        #[arg(long)]
        code: String,
    },
    /// Remove the stored session.
    Logout,
    /// Show whether a session is stored.
    Status,
}

#[derive(clap::Args, Debug)]
struct RequestArgs {
    /// Path relative to the base URL, or an absolute URL.
    url: String,
    /// JSON payload (query string for GET/DELETE, body otherwise).
    #[arg(short, long, value_name = "JSON")]
    data: Option<String>,
    /// Extra header, `NAME:VALUE` (repeatable).
    #[arg(short = 'H', long = "header", value_name = "NAME:VALUE")]
    headers: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let watcher = match &cli.config {
        Some(path) => Some(
            ConfigWatcher::new(path.clone()).map_err(|e| anyhow::anyhow!("config error: {e}"))?,
        ),
        None => None,
    };
    let config = match &watcher {
        Some(w) => w.arc(),
        None => Arc::new(arc_swap_from(
            Config::from_env().map_err(|e| anyhow::anyhow!("config error: {e}"))?,
        )),
    };
    let _log_guard = init_tracing(&config.load().log)?;

    let login: Arc<dyn LoginProvider> = match (&cli.command, &cli.login_code) {
        (Commands::Login { code }, _) | (_, Some(code)) => {
            Arc::new(StaticLoginProvider::new(code.clone()))
        }
        _ => Arc::new(NoLoginProvider),
    };
    let client = ApiClient::builder(config)
        .transport(Arc::new(HttpTransport::new(build_http_client())))
        .storage(Arc::new(open_store(cli.db).await?))
        .login_provider(login)
        .build();

    match cli.command {
        Commands::Get(args) => cmd_request(&client, Method::Get, args).await,
        Commands::Post(args) => cmd_request(&client, Method::Post, args).await,
        Commands::Put(args) => cmd_request(&client, Method::Put, args).await,
        Commands::Delete(args) => cmd_request(&client, Method::Delete, args).await,
        Commands::Upload {
            url,
            file,
            name,
            form,
            headers,
        } => cmd_upload(&client, url, file, name, &form, &headers).await,
        Commands::Login { .. } => cmd_login(&client).await,
        Commands::Logout => cmd_logout(&client).await,
        Commands::Status => cmd_status(&client).await,
    }
}

fn arc_swap_from(config: Config) -> arc_swap::ArcSwap<Config> {
    arc_swap::ArcSwap::from_pointee(config)
}

async fn cmd_request(client: &ApiClient, method: Method, args: RequestArgs) -> Result<()> {
    let mut options = RequestOptions::new(method, args.url);
    if let Some(raw) = args.data {
        let data = serde_json::from_str(&raw).context("--data is not valid JSON")?;
        options = options.data(data);
    }
    for raw in &args.headers {
        let (name, value) = split_pair(raw, ':')?;
        options = options.header(name, value);
    }
    let envelope = client.request(options).await.map_err(request_failed)?;
    print_envelope(&envelope)
}

async fn cmd_upload(
    client: &ApiClient,
    url: String,
    file: PathBuf,
    name: String,
    form: &[String],
    headers: &[String],
) -> Result<()> {
    let mut options = UploadOptions::new(url, file.display().to_string(), name);
    for raw in form {
        let (key, value) = split_pair(raw, '=')?;
        options = options.form(key, value);
    }
    for raw in headers {
        let (key, value) = split_pair(raw, ':')?;
        options = options.header(key, value);
    }
    let envelope = client
        .upload_image(options)
        .await
        .map_err(request_failed)?;
    print_envelope(&envelope)
}

async fn cmd_login(client: &ApiClient) -> Result<()> {
    client
        .session()
        .login()
        .await
        .map_err(|e| anyhow::anyhow!("login failed: {e}"))?;
    eprintln!("login successful");
    Ok(())
}

async fn cmd_logout(client: &ApiClient) -> Result<()> {
    client
        .session()
        .logout()
        .await
        .map_err(|e| anyhow::anyhow!("logout failed: {e}"))?;
    eprintln!("logged out");
    Ok(())
}

async fn cmd_status(client: &ApiClient) -> Result<()> {
    let session = client.session();
    if session.is_authenticated().await {
        println!("authenticated");
        if let Some(info) = session.account_info().await? {
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    } else {
        println!("not authenticated");
    }
    Ok(())
}

fn request_failed(e: minireq_client::Error) -> anyhow::Error {
    if e.is_transport() {
        anyhow::anyhow!("request failed: {e} (is `base_url` reachable?)")
    } else {
        anyhow::anyhow!("request failed: {e}")
    }
}

fn print_envelope(envelope: &Envelope) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(envelope)?);
    Ok(())
}

fn split_pair(raw: &str, sep: char) -> Result<(String, String)> {
    let (k, v) = raw
        .split_once(sep)
        .ok_or_else(|| anyhow::anyhow!("expected `KEY{sep}VALUE`, got '{raw}'"))?;
    Ok((k.trim().to_string(), v.trim().to_string()))
}

fn init_tracing(log: &LogConfig) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));

    let (writer, guard) = match &log.file {
        Some(path) => {
            let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
            std::fs::create_dir_all(dir)?;
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("log.file has no file name"))?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(guard)
}

async fn open_store(db: Option<PathBuf>) -> Result<SqliteStorage> {
    let path = db.unwrap_or_else(default_db_path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let url = format!("sqlite://{}", path.display());
    SqliteStorage::new(&url)
        .await
        .map_err(|e| anyhow::anyhow!("database error: {e}"))
}

fn default_db_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".minireq").join("session.db")
}
