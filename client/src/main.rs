//! Command-line front end for the ballotbox voting platform.
//!
//! Each run revalidates the persisted session, signs in when credentials are
//! given and no session could be restored, runs one command, and prints the
//! result as JSON.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use ballotbox::{Ballotbox, Config, Document, ElectionDraft, ElectionUpdate, Registration};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ballotbox", version, about = "Vote in and manage ballotbox elections")]
struct Cli {
    /// Base URL of the REST API
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Directory holding the cached session
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[arg(long, env = "BALLOTBOX_EMAIL", global = true)]
    email: Option<String>,

    #[arg(long, env = "BALLOTBOX_PASSWORD", global = true, hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the signed-in user
    Whoami,
    /// Create an account with --email and --password
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
    },
    /// End the session
    Logout,
    /// List elections
    Elections,
    /// Show one election
    Election { id: i64 },
    /// Create an election from a JSON draft
    Create {
        draft: String,
        /// PDF attached to the election
        #[arg(long)]
        document: Option<PathBuf>,
    },
    /// Edit an election that has not started, from a JSON update
    Update { id: i64, update: String },
    /// Delete an election
    Delete { id: i64 },
    /// Vote for one or more candidates
    Vote {
        id: i64,
        #[arg(required = true)]
        candidates: Vec<i64>,
    },
    /// Show your vote in an election
    MyVote { id: i64 },
    /// Show vote counts per candidate
    Results { id: i64 },
    /// Show your profile
    Profile,
    /// List your votes with their elections
    History,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ballotbox=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load();
    if let Some(api_url) = cli.api_url.clone() {
        config.api_url = api_url;
    }
    if let Some(data_dir) = cli.data_dir.clone() {
        config.data_dir = data_dir;
    }

    let app = Ballotbox::connect(&config)?;
    run(&app, cli).await
}

async fn run(app: &Ballotbox, cli: Cli) -> Result<()> {
    if let Command::Register {
        first_name,
        last_name,
    } = &cli.command
    {
        let (email, password) = credentials(&cli)?;
        let registration = Registration {
            email: email.to_string(),
            password: password.to_string(),
            first_name: first_name.clone(),
            last_name: last_name.clone(),
        };
        return print(&app.auth.register(&registration).await?);
    }

    let session = app.session.initialize().await;
    if !session.authenticated {
        if let (Some(email), Some(password)) = (&cli.email, &cli.password) {
            app.sign_in(email, password).await?;
        }
    }

    match cli.command {
        Command::Register { .. } => Ok(()),
        Command::Whoami => match app.session.user() {
            Some(user) => print(&user),
            None => bail!("not signed in"),
        },
        Command::Logout => {
            app.session.logout().await;
            Ok(())
        }
        Command::Elections => print(&app.elections.list().await?),
        Command::Election { id } => print(&app.elections.get(id).await?),
        Command::Create { draft, document } => {
            let draft: ElectionDraft =
                serde_json::from_str(&draft).context("election draft is not valid JSON")?;
            let document = match document {
                Some(path) => Some(read_document(&path)?),
                None => None,
            };
            print(&app.elections.create(&draft, document).await?)
        }
        Command::Update { id, update } => {
            let update: ElectionUpdate =
                serde_json::from_str(&update).context("election update is not valid JSON")?;
            let election = app.elections.get(id).await?;
            let user = app.session.user().context("not signed in")?;
            if !election.can_edit_settings(&user, chrono::Utc::now()) {
                bail!("only the owner can edit an election, and only before voting starts");
            }
            print(&app.elections.update(id, &update).await?)
        }
        Command::Delete { id } => {
            app.elections.delete(id).await?;
            Ok(())
        }
        Command::Vote { id, candidates } => {
            let election = app.elections.get(id).await?;
            let now = chrono::Utc::now();
            if !election.has_started(now) {
                bail!("voting has not started yet");
            }
            if election.has_ended(now) {
                bail!("this election has ended");
            }
            if candidates.len() > election.max_votes() as usize {
                bail!("you can select at most {} candidate(s)", election.max_votes());
            }
            if let Some(unknown) = candidates.iter().find(|id| election.candidate(**id).is_none()) {
                bail!("candidate {unknown} is not on this ballot");
            }
            print(&app.elections.submit_vote(id, &candidates).await?)
        }
        Command::MyVote { id } => print(&app.elections.my_vote(id).await?.unwrap_or(Value::Null)),
        Command::Results { id } => print(&app.elections.results(id).await?),
        Command::Profile => print(&app.profiles.my_profile().await?),
        Command::History => {
            let user = app.session.user().context("not signed in")?;
            print(&app.profiles.vote_history(user.id).await?)
        }
    }
}

fn credentials(cli: &Cli) -> Result<(&str, &str)> {
    match (&cli.email, &cli.password) {
        (Some(email), Some(password)) => Ok((email.as_str(), password.as_str())),
        _ => bail!("--email and --password are required"),
    }
}

fn read_document(path: &Path) -> Result<Document> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());
    let is_pdf = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    let content_type = if is_pdf { "application/pdf" } else { "application/octet-stream" };
    Ok(Document::new(file_name, content_type, bytes)?)
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
