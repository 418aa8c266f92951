use std::fmt;
use std::sync::Arc;

use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use services::{
    ANON_KEY_VAR, AccountService, AppServices, BACKEND_URL_VAR, BackendChoice, BackendConfig,
    Clock, InMemoryBackend, LessonService, SessionHandles,
};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use ui::{App, DesktopLinkOpener, LinkOpenerRef, UiApp, build_app_context};

const DB_URL_VAR: &str = "LINGO_DB_URL";
const DEFAULT_DB_URL: &str = "sqlite://dev.sqlite3";
const DEFAULT_LOG_FILTER: &str = "app=info,services=info,storage=info";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    MissingBackend { var: &'static str },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::MissingBackend { var } => {
                write!(f, "{var} is not set; pass --backend-url/--anon-key or run with --demo")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

struct DesktopApp {
    lessons: Arc<LessonService>,
    accounts: Arc<AccountService>,
    session: SessionHandles,
}

impl UiApp for DesktopApp {
    fn lessons(&self) -> Arc<LessonService> {
        Arc::clone(&self.lessons)
    }

    fn accounts(&self) -> Arc<AccountService> {
        Arc::clone(&self.accounts)
    }

    fn session(&self) -> SessionHandles {
        self.session.clone()
    }

    fn link_opener(&self) -> LinkOpenerRef {
        Arc::new(DesktopLinkOpener)
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    db_url: String,
    backend_url: Option<String>,
    anon_key: Option<String>,
    demo: bool,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--db <sqlite_url>] [--backend-url <url>] [--anon-key <key>]");
    eprintln!("  cargo run -p app -- --demo [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  {DB_URL_VAR}, {BACKEND_URL_VAR}, {ANON_KEY_VAR}, RUST_LOG");
    eprintln!();
    eprintln!("--demo uses an in-memory identity service with two accounts:");
    eprintln!("  learner@example.com / password123 (free plan)");
    eprintln!("  admin@example.com   / password123 (admin, premium plan)");
}

impl Args {
    fn parse(
        args: &mut impl Iterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut db_url = env(DB_URL_VAR).map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);
        let mut backend_url = env(BACKEND_URL_VAR);
        let mut anon_key = env(ANON_KEY_VAR);
        let mut demo = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--backend-url" => backend_url = Some(require_value(args, "--backend-url")?),
                "--anon-key" => anon_key = Some(require_value(args, "--anon-key")?),
                "--demo" => demo = true,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            backend_url,
            anon_key,
            demo,
        })
    }

    fn backend(&self) -> Result<BackendChoice, Box<dyn std::error::Error>> {
        if self.demo {
            return Ok(BackendChoice::InMemory(InMemoryBackend::demo()));
        }
        let url = self
            .backend_url
            .as_deref()
            .ok_or(ArgsError::MissingBackend { var: BACKEND_URL_VAR })?;
        let key = self
            .anon_key
            .as_deref()
            .ok_or(ArgsError::MissingBackend { var: ANON_KEY_VAR })?;
        Ok(BackendChoice::Hosted(BackendConfig::new(url, key)?))
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    if argv.iter().any(|arg| arg == "--help" || arg == "-h") {
        print_usage();
        return Ok(());
    }

    let parsed = Args::parse(&mut argv.into_iter(), |name| std::env::var(name).ok()).map_err(
        |e| {
            eprintln!("{e}");
            print_usage();
            e
        },
    )?;
    let backend = parsed.backend()?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(&parsed.db_url, Clock::system(), backend).await?;
    info!(db = %parsed.db_url, demo = parsed.demo, "services ready");

    // The listeners live on this runtime for as long as the window is open.
    let session = services.mount_session();

    let app: Arc<dyn UiApp> = Arc::new(DesktopApp {
        lessons: services.lessons(),
        accounts: services.accounts(),
        session,
    });
    let context = build_app_context(&app);

    // On macOS, Dioxus/tao can default to an always-on-top window in some dev setups.
    let desktop_cfg = DesktopConfig::new().with_window(
        WindowBuilder::new()
            .with_title("Tagalog Learn")
            .with_always_on_top(false),
    );

    LaunchBuilder::desktop()
        .with_cfg(desktop_cfg)
        .with_context(context)
        .launch(App);
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
