use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rollcall::http::ApiConfig;
use rollcall::models::ExportKind;
use rollcall::screens::{Command, Flow, Session, attendance};
use rollcall::services::ExportConfig;
use rollcall::state::AppState;

/// rollcall - daily attendance for the class roster
#[derive(Parser, Debug)]
#[command(name = "rollcall")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Base URL of the attendance service (overrides ROLLCALL_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Request timeout in seconds (overrides ROLLCALL_TIMEOUT_SECS)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Directory exported spreadsheets are saved to (overrides ROLLCALL_EXPORT_DIR)
    #[arg(long)]
    export_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive attendance screen (default)
    Shell,

    /// Print today's roster
    List {
        /// Only show students whose name contains this text
        #[arg(long)]
        search: Option<String>,
    },

    /// Register a new student
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        class: String,
        #[arg(long)]
        place: String,
        /// Record the student as absent today
        #[arg(long)]
        absent: bool,
    },

    /// Download and share a spreadsheet
    Export {
        #[command(subcommand)]
        kind: ExportTarget,
    },
}

#[derive(Subcommand, Debug)]
enum ExportTarget {
    /// The full student list
    Students,
    /// Attendance of one day
    Attendance {
        /// Day as YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "rollcall=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut api = ApiConfig::from_env_with_url(cli.api_url)?;
    if let Some(secs) = cli.timeout {
        api = api.with_timeout(Duration::from_secs(secs));
    }
    let mut export = ExportConfig::new_from_env();
    if let Some(dir) = cli.export_dir {
        export.export_dir = dir;
    }
    info!("using {} (timeout {:?})", api.base_url, api.timeout);

    let state = AppState::from_config(api, &export)?;

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => run_shell(state).await?,
        Commands::List { search } => {
            state.roster.load().await?;
            if let Some(text) = search {
                state.roster.set_search(&text);
            }
            print!("{}", attendance::render(&state.roster.snapshot()));
        }
        Commands::Add {
            name,
            class,
            place,
            absent,
        } => {
            state.roster.load().await?;
            let mut flow = state.add_student_flow();
            flow.open();
            flow.set_name(&name);
            flow.set_class(&class);
            flow.set_place(&place);
            flow.set_attendance(!absent);
            let notice = flow.submit(&state.roster).await?;
            if notice.is_error() {
                return Err(notice.message.into());
            }
            println!("{}", notice.message);
        }
        Commands::Export { kind } => {
            let kind = match kind {
                ExportTarget::Students => ExportKind::Roster,
                ExportTarget::Attendance { date } => ExportKind::Attendance(date),
            };
            let outcome = state.reports.export(kind).await?;
            let notice = outcome.notice();
            println!("{}", notice.message);
            if notice.is_error() {
                return Err(notice.message.into());
            }
        }
    }

    Ok(())
}

async fn run_shell(state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::new(state);
    print!("{}", session.start().await);
    prompt()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.parse::<Command>() {
            Ok(command) => match session.handle(command).await {
                Flow::Continue(output) => print!("{}", output),
                Flow::Quit => break,
            },
            Err(e) => println!("{}", e),
        }
        prompt()?;
    }
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "> ")?;
    stdout.flush()
}
