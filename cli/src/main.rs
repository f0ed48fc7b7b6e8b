use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use lectern::api::{self, KnowledgeDocForm, LectureForm, PageQuery, Upload};
use lectern::config::{ClientConfig, ConfigError, normalize_base_url};
use lectern::net::TransportError;
use lectern::notify::{Notice, NoticeLevel, Notifier};
use lectern::routing::{self, GuardState, MemoryNavigator};
use lectern::storage::FileStorage;
use lectern::{ApiClient, ApiError, Credentials, Registration, Scope, SessionStore};
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("client setup failed: {0}")]
    Transport(#[from] TransportError),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("invalid --field `{0}`; expected key=value")]
    InvalidField(String),
    #[error("{0} failed")]
    Rejected(&'static str),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "lectern", about = "Lecture console and chat client session CLI")]
struct Cli {
    /// Backend base URL. Overrides `LECTERN_BASE_URL`.
    #[arg(long)]
    base_url: Option<String>,

    /// Session file standing in for browser storage. Overrides `LECTERN_STATE_FILE`.
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Request timeout in seconds. Overrides `LECTERN_REQUEST_TIMEOUT_SECS`.
    #[arg(long)]
    timeout: Option<u64>,

    /// Page the console is showing while the command runs.
    #[arg(long, default_value = "/")]
    location: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in to the chat client.
    Login(LoginArgs),
    /// Create a chat user account.
    Register(RegisterArgs),
    /// Sign out of the chat client.
    Logout,
    /// Show both sessions.
    Whoami,
    /// Where navigating to PATH would land right now.
    Guard { path: String },
    Admin(AdminCommand),
    Lectures(LectureCommand),
    Knowledge(KnowledgeCommand),
}

#[derive(Args, Debug)]
struct LoginArgs {
    username: String,
    #[arg(long, env = "LECTERN_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args, Debug)]
struct RegisterArgs {
    username: String,
    #[arg(long, env = "LECTERN_PASSWORD", hide_env_values = true)]
    password: String,
    /// Extra registration field, `key=value`. Repeatable.
    #[arg(long = "field")]
    fields: Vec<String>,
}

#[derive(Args, Debug)]
struct AdminCommand {
    #[command(subcommand)]
    command: AdminSubcommand,
}

#[derive(Subcommand, Debug)]
enum AdminSubcommand {
    Login(LoginArgs),
    Logout,
    /// Fetch the signed-in admin's profile.
    Profile,
    /// Update profile fields, `--field key=value`.
    UpdateProfile {
        #[arg(long = "field", required = true)]
        fields: Vec<String>,
    },
    /// Upload a file and print the stored URL.
    Upload { path: PathBuf },
}

#[derive(Args, Debug)]
struct PageArgs {
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long, default_value_t = 10)]
    size: u32,
    /// Endpoint filter, `key=value`. Repeatable.
    #[arg(long = "filter")]
    filters: Vec<String>,
}

#[derive(Args, Debug)]
struct LectureCommand {
    #[command(subcommand)]
    command: LectureSubcommand,
}

#[derive(Subcommand, Debug)]
enum LectureSubcommand {
    Page(PageArgs),
    Create {
        #[arg(long)]
        capacity: i64,
        #[arg(long = "field")]
        fields: Vec<String>,
    },
    Update {
        id: i64,
        #[arg(long)]
        capacity: i64,
        #[arg(long = "field")]
        fields: Vec<String>,
    },
    /// Resubmit a rejected lecture.
    Recreate {
        id: i64,
        #[arg(long)]
        capacity: i64,
        #[arg(long = "field")]
        fields: Vec<String>,
    },
    Delete {
        id: i64,
    },
    /// Review a lecture (super admin).
    Check {
        id: i64,
        status: i64,
    },
}

#[derive(Args, Debug)]
struct KnowledgeCommand {
    #[command(subcommand)]
    command: KnowledgeSubcommand,
}

#[derive(Subcommand, Debug)]
enum KnowledgeSubcommand {
    Page(PageArgs),
    Detail {
        id: i64,
    },
    Create {
        #[arg(long)]
        file: PathBuf,
        #[arg(long = "field")]
        fields: Vec<String>,
    },
    Update {
        id: i64,
        #[arg(long = "field", required = true)]
        fields: Vec<String>,
    },
    Delete {
        id: i64,
        resource_url: String,
    },
}

/// Prints notices to stderr so stdout stays machine-readable.
struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, notice: Notice) {
        let tag = match notice.level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warn",
            NoticeLevel::Error => "error",
        };
        eprintln!("[{tag}] {}", notice.message);
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;
    let navigator = Arc::new(MemoryNavigator::new(cli.location.clone()));
    let storage = Arc::new(FileStorage::open_or_empty(&config.state_file));
    let client = Arc::new(ApiClient::from_config(&config, storage, Arc::new(StderrNotifier), navigator.clone())?);
    tracing::debug!(base_url = %config.base_url, state_file = %config.state_file.display(), "client ready");

    let result = run(&client, cli.command).await;
    if let Some(landed) = navigator.last_push() {
        eprintln!("-> {landed}");
    }
    result
}

fn build_config(cli: &Cli) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config.base_url = normalize_base_url(base_url)?;
    }
    if let Some(state_file) = &cli.state_file {
        config.state_file.clone_from(state_file);
    }
    if let Some(timeout) = cli.timeout.filter(|t| *t > 0) {
        config.timeouts.request_secs = timeout;
    }
    Ok(config)
}

async fn run(client: &Arc<ApiClient>, command: Command) -> Result<(), CliError> {
    match command {
        Command::Login(args) => login(&SessionStore::user(client.clone()), args).await,
        Command::Register(args) => {
            let mut registration = Registration::new(args.username, args.password);
            for (key, value) in parse_fields(&args.fields)? {
                registration = registration.with_field(key, value);
            }
            if SessionStore::user(client.clone()).register(&registration).await {
                Ok(())
            } else {
                Err(CliError::Rejected("registration"))
            }
        }
        Command::Logout => {
            SessionStore::user(client.clone()).logout();
            Ok(())
        }
        Command::Whoami => whoami(client),
        Command::Guard { path } => {
            let state = GuardState::from_sessions(client.sessions());
            let decision = routing::decide(&path, &state);
            let landed = routing::resolve(&path, &state);
            print_json(&serde_json::json!({ "decision": format!("{decision:?}"), "lands": landed }))
        }
        Command::Admin(admin) => run_admin(client, admin.command).await,
        Command::Lectures(lectures) => run_lectures(client, lectures.command).await,
        Command::Knowledge(knowledge) => run_knowledge(client, knowledge.command).await,
    }
}

async fn login(store: &SessionStore, args: LoginArgs) -> Result<(), CliError> {
    if store.login(&Credentials::new(args.username, args.password)).await {
        Ok(())
    } else {
        Err(CliError::Rejected("login"))
    }
}

fn whoami(client: &ApiClient) -> Result<(), CliError> {
    let describe = |scope: Scope| match client.sessions().identity(scope) {
        Some(identity) => serde_json::to_value(identity),
        None => Ok(Value::Null),
    };
    print_json(&serde_json::json!({
        "user": describe(Scope::User)?,
        "admin": describe(Scope::Admin)?,
    }))
}

async fn run_admin(client: &Arc<ApiClient>, command: AdminSubcommand) -> Result<(), CliError> {
    match command {
        AdminSubcommand::Login(args) => login(&SessionStore::admin(client.clone()), args).await,
        AdminSubcommand::Logout => {
            SessionStore::admin(client.clone()).logout();
            Ok(())
        }
        AdminSubcommand::Profile => {
            let profile = api::admin_detail(client).await?;
            print_json(&serde_json::to_value(profile)?)
        }
        AdminSubcommand::UpdateProfile { fields } => {
            let changes: Map<String, Value> = parse_fields(&fields)?.into_iter().collect();
            print_json(&api::update_admin_profile(client, &changes).await?)
        }
        AdminSubcommand::Upload { path } => {
            let upload = Upload::from_path(&path)?;
            print_json(&api::upload_file(client, upload).await?)
        }
    }
}

async fn run_lectures(client: &ApiClient, command: LectureSubcommand) -> Result<(), CliError> {
    match command {
        LectureSubcommand::Page(args) => {
            let page = api::lecture_page(client, &page_query(&args)?).await?;
            print_json(&serde_json::json!({
                "total": page.total,
                "current": page.current,
                "records": page.records,
            }))
        }
        LectureSubcommand::Create { capacity, fields } => {
            let form = lecture_form(None, capacity, &fields)?;
            print_json(&api::create_lecture(client, &form).await?)
        }
        LectureSubcommand::Update { id, capacity, fields } => {
            let form = lecture_form(Some(id), capacity, &fields)?;
            print_json(&api::update_lecture(client, &form).await?)
        }
        LectureSubcommand::Recreate { id, capacity, fields } => {
            let form = lecture_form(Some(id), capacity, &fields)?;
            print_json(&api::recreate_lecture(client, &form).await?)
        }
        LectureSubcommand::Delete { id } => print_json(&api::delete_lecture(client, id).await?),
        LectureSubcommand::Check { id, status } => print_json(&api::check_lecture(client, id, status).await?),
    }
}

async fn run_knowledge(client: &ApiClient, command: KnowledgeSubcommand) -> Result<(), CliError> {
    match command {
        KnowledgeSubcommand::Page(args) => {
            let page = api::knowledge_doc_page(client, &page_query(&args)?).await?;
            print_json(&serde_json::json!({
                "total": page.total,
                "current": page.current,
                "records": page.records,
            }))
        }
        KnowledgeSubcommand::Detail { id } => {
            let doc = api::knowledge_doc_detail(client, id).await?;
            print_json(&serde_json::to_value(doc)?)
        }
        KnowledgeSubcommand::Create { file, fields } => {
            let form = knowledge_form(None, &fields)?;
            let upload = Upload::from_path(&file)?;
            print_json(&api::create_knowledge_doc(client, &form, upload).await?)
        }
        KnowledgeSubcommand::Update { id, fields } => {
            let form = knowledge_form(Some(id), &fields)?;
            print_json(&api::update_knowledge_doc(client, &form).await?)
        }
        KnowledgeSubcommand::Delete { id, resource_url } => {
            print_json(&api::delete_knowledge_doc(client, id, &resource_url).await?)
        }
    }
}

fn lecture_form(id: Option<i64>, capacity: i64, fields: &[String]) -> Result<LectureForm, CliError> {
    let mut form = LectureForm::new(capacity);
    form.id = id;
    form.details = parse_fields(fields)?.into_iter().collect();
    Ok(form)
}

fn knowledge_form(id: Option<i64>, fields: &[String]) -> Result<KnowledgeDocForm, CliError> {
    let mut form = KnowledgeDocForm::new();
    form.id = id;
    form.fields = parse_fields(fields)?.into_iter().collect();
    Ok(form)
}

fn page_query(args: &PageArgs) -> Result<PageQuery, CliError> {
    let mut query = PageQuery::new(args.page, args.size);
    for filter in &args.filters {
        let (key, value) = filter.split_once('=').ok_or_else(|| CliError::InvalidField(filter.clone()))?;
        query = query.filter(key.trim(), value);
    }
    Ok(query)
}

/// `key=value` pairs. Values that parse as JSON keep their type; anything
/// else is sent as a string.
fn parse_fields(raw: &[String]) -> Result<Vec<(String, Value)>, CliError> {
    raw.iter()
        .map(|field| {
            let (key, value) = field.split_once('=').ok_or_else(|| CliError::InvalidField(field.clone()))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(CliError::InvalidField(field.clone()));
            }
            let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));
            Ok((key.to_owned(), value))
        })
        .collect()
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
