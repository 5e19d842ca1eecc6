//! Zist CLI - command-line front end for zist-core.
//!
//! Lists, filters and edits gists from a terminal. Results are printed to
//! stdout as JSON; logs go to stderr.

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use zist_core::sidecar::{encode_description, parse_description, update_description};
use zist_core::{
    query, ClientConfig, DraftFile, FilterSpec, GistDraft, GistScope, Session, SidecarConfig,
    SortField, SortOrder, UiEffects, ZistApi,
};

#[derive(Parser, Debug)]
#[command(name = "zist")]
#[command(about = "Browse, filter and organize GitHub Gists")]
struct Args {
    /// GitHub access token
    #[arg(long, env = "GITHUB_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    /// Numeric id of the signed-in GitHub user
    #[arg(long, env = "ZIST_USER_ID", global = true)]
    user_id: Option<String>,

    /// Login of the signed-in GitHub user
    #[arg(long, env = "ZIST_LOGIN", global = true)]
    login: Option<String>,

    /// Origin of the local proxy used when GitHub cannot be reached
    #[arg(long, global = true)]
    proxy_origin: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs, Debug)]
struct Source {
    /// Read this user's public gists instead of your own
    #[arg(long)]
    user: Option<String>,
}

impl Source {
    fn scope(&self) -> GistScope {
        match &self.user {
            Some(user) => GistScope::user(user),
            None => GistScope::Authenticated,
        }
    }
}

#[derive(ClapArgs, Debug)]
struct FilterArgs {
    #[arg(long)]
    category: Option<String>,

    /// Keep gists carrying any of these tags (repeatable)
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// Case-insensitive text in the description or file names
    #[arg(long)]
    search: Option<String>,

    #[arg(long)]
    language: Option<String>,

    /// Only private gists
    #[arg(long)]
    private: bool,
}

impl From<FilterArgs> for FilterSpec {
    fn from(args: FilterArgs) -> Self {
        FilterSpec {
            category: args.category,
            tags: args.tags,
            search: args.search,
            language: args.language,
            private: args.private.then_some(true),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List gists, filtered and sorted
    List {
        #[command(flatten)]
        source: Source,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, default_value = "updated")]
        sort: SortField,
        #[arg(long, default_value = "desc")]
        order: SortOrder,
    },
    /// Distinct categories in use
    Categories {
        #[command(flatten)]
        source: Source,
    },
    /// Distinct tags in use
    Tags {
        #[command(flatten)]
        source: Source,
    },
    /// Distinct file languages in use
    Languages {
        #[command(flatten)]
        source: Source,
    },
    /// Show one gist
    Show {
        id: String,
        /// Also fetch the content of every file
        #[arg(long)]
        files: bool,
    },
    /// Create a gist from local files
    Create {
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        public: bool,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Delete a gist
    Delete { id: String },
    /// Set the category of a gist
    SetCategory { id: String, category: String },
    /// Remove the category of a gist
    DeleteCategory { id: String },
    /// Replace the tags of a gist
    SetTags { id: String, tags: Vec<String> },
    /// Split a raw description into text and config, optionally re-encoding it
    Describe {
        description: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Show a GitHub user's profile
    User { username: String },
}

/// Reports settled mutations through the log.
struct LogEffects;

impl UiEffects for LogEffects {
    fn navigate(&self, route: &str) {
        info!("Done, returning to {}", route);
    }

    fn notify_failure(&self, message: &str) {
        error!("{}", message);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging; RUST_LOG wins over --debug when set.
    match EnvFilter::try_from_default_env() {
        Ok(filter) => FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .init(),
        Err(_) => {
            let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
            FmtSubscriber::builder()
                .with_max_level(log_level)
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact()
                .init()
        }
    }

    // Offline commands need no client.
    if let Command::Describe {
        description,
        category,
        tags,
    } = &args.command
    {
        return describe(description, category.clone(), tags.clone());
    }

    let mut config = ClientConfig::from_env().context("Invalid environment configuration")?;
    if let Some(origin) = &args.proxy_origin {
        config = config.with_proxy_origin(origin);
    }

    let session = Session {
        access_token: args.token.clone(),
        user_id: args.user_id.clone(),
        login: args.login.clone(),
    };
    let api = ZistApi::builder(session)
        .config(config)
        .effects(Arc::new(LogEffects))
        .build()?;

    run(&api, args.command).await
}

async fn run(api: &ZistApi, command: Command) -> Result<()> {
    let reader = api.reader();
    let coordinator = api.coordinator();

    match command {
        Command::List {
            source,
            filter,
            sort,
            order,
        } => {
            let gists = reader
                .view(&source.scope(), &filter.into(), sort, order)
                .await?;
            info!("{} gists match", gists.len());
            print_json(&gists)
        }
        Command::Categories { source } => {
            let gists = reader.load_all(&source.scope()).await?;
            print_json(&query::categories(&gists))
        }
        Command::Tags { source } => {
            let gists = reader.load_all(&source.scope()).await?;
            print_json(&query::tags(&gists))
        }
        Command::Languages { source } => {
            let gists = reader.load_all(&source.scope()).await?;
            print_json(&query::languages(&gists))
        }
        Command::Show { id, files } => {
            let gist = reader.get_gist(&id).await?;
            let parsed = parse_description(&gist.description);
            let contents = if files {
                Some(reader.get_all_files(&gist.files).await?)
            } else {
                None
            };
            print_json(&json!({
                "gist": gist,
                "text": parsed.text,
                "config": parsed.config,
                "contents": contents,
            }))
        }
        Command::Create {
            description,
            category,
            tags,
            public,
            files,
        } => {
            let config = SidecarConfig::default()
                .merged(category, (!tags.is_empty()).then_some(tags));
            let description = if config.is_empty() {
                description
            } else {
                encode_description(&description, &config)
            };
            let draft = GistDraft {
                description,
                public,
                files: files
                    .iter()
                    .map(|path| read_draft_file(path))
                    .collect::<Result<Vec<_>>>()?,
            };
            let created = coordinator.create_draft(draft).await?;
            print_json(&created)
        }
        Command::Delete { id } => {
            coordinator.delete(&id).await?;
            print_json(&json!({ "deleted": id }))
        }
        Command::SetCategory { id, category } => {
            if category.trim().is_empty() {
                bail!("Category must not be empty");
            }
            print_json(&coordinator.set_category(&id, &category).await?)
        }
        Command::DeleteCategory { id } => print_json(&coordinator.delete_category(&id).await?),
        Command::SetTags { id, tags } => print_json(&coordinator.set_tags(&id, tags).await?),
        Command::User { username } => print_json(&reader.get_user(&username).await?),
        Command::Describe {
            description,
            category,
            tags,
        } => describe(&description, category, tags),
    }
}

fn describe(description: &str, category: Option<String>, tags: Vec<String>) -> Result<()> {
    let parsed = parse_description(description);
    if category.is_none() && tags.is_empty() {
        return print_json(&json!({ "text": parsed.text, "config": parsed.config }));
    }
    let config = parsed
        .config
        .merged(category, (!tags.is_empty()).then_some(tags));
    print_json(&json!({ "description": update_description(description, &config) }))
}

fn read_draft_file(path: &Path) -> Result<DraftFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(DraftFile { filename, content })
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
