use clap::{Parser, Subcommand, ValueEnum};
use meetup_engine::config::Settings;
use meetup_engine::engine::{Engine, EngineOptions};
use meetup_engine::models::{
    MatchupRequest, MeetupResponse, ReconnectRequest, RescheduleRequest, ResolveTimeRequest,
    RespondRequest, SetVenueRequest,
};
use meetup_engine::services::{AppwriteCollections, AppwriteStore, CacheManager, CachedStore};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "meetup-engine")]
#[command(about = "Admin actions for community meetup matching and scheduling", long_about = None)]
struct Cli {
    /// Settings file to use instead of config/default.toml + config/local.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pair a community's opted-in members and create their meetups
    Matchup { community: String },
    /// Find the earliest window the listed members share
    ResolveTime {
        #[arg(num_args = 2.., required = true)]
        members: Vec<String>,
        /// Meeting length in hours
        #[arg(long)]
        length: Option<u32>,
    },
    /// Accept or decline a meetup on behalf of a member
    Respond {
        meeting: String,
        member: String,
        #[arg(value_enum)]
        response: ResponseArg,
    },
    /// Create a fresh meetup between two members of a community
    Reconnect {
        community: String,
        requester: String,
        other: String,
    },
    /// Settle a meetup's venue from proposed venues
    Venue {
        meeting: String,
        #[arg(required = true)]
        venues: Vec<String>,
    },
    /// Pick a new window for a meetup from its participants' schedules
    Reschedule {
        meeting: String,
        #[arg(long)]
        length: Option<u32>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ResponseArg {
    Accept,
    Decline,
}

impl From<ResponseArg> for MeetupResponse {
    fn from(value: ResponseArg) -> Self {
        match value {
            ResponseArg::Accept => MeetupResponse::Accept,
            ResponseArg::Decline => MeetupResponse::Decline,
        }
    }
}

fn init_logging() {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

async fn build_engine(settings: &Settings) -> Result<Engine, Box<dyn std::error::Error>> {
    let collections = AppwriteCollections {
        accounts: settings.collections.accounts.clone(),
        communities: settings.collections.communities.clone(),
        meetings: settings.collections.meetings.clone(),
        ratings: settings.collections.ratings.clone(),
    };

    let store = AppwriteStore::new(
        settings.store.endpoint.clone(),
        settings.store.api_key.clone(),
        settings.store.project_id.clone(),
        settings.store.database_id.clone(),
        collections,
        Duration::from_secs(settings.store.timeout_secs),
    )?;

    info!("Document store client initialized");

    let cache_ttl = settings.cache.ttl_secs.unwrap_or(300);
    let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(1000);

    let cache = match &settings.cache.redis_url {
        Some(url) => match CacheManager::new(url, l1_cache_size, cache_ttl).await {
            Ok(c) => {
                info!("Cache manager initialized (L1: {} entries, TTL: {}s, Redis enabled)", l1_cache_size, cache_ttl);
                c
            }
            Err(e) => {
                error!("Failed to connect to Redis ({}), caching member reads in-process only", e);
                CacheManager::in_memory(l1_cache_size, cache_ttl)
            }
        },
        None => CacheManager::in_memory(l1_cache_size, cache_ttl),
    };

    let store = CachedStore::new(store, Arc::new(cache));
    let options = EngineOptions::from(&settings.matching);

    info!("Engine initialized with options: {:?}", options);

    Ok(Engine::new(Arc::new(store), options))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };

    info!("Configuration loaded successfully");

    let engine = build_engine(&settings).await?;

    match cli.command {
        Command::Matchup { community } => {
            let report = engine
                .run_matchup(&MatchupRequest { community_id: community })
                .await?;
            print_json(&report)?;
        }
        Command::ResolveTime { members, length } => {
            let proposal = engine
                .resolve_time(&ResolveTimeRequest {
                    participants: members,
                    meeting_length: length,
                })
                .await?;
            print_json(&proposal)?;
        }
        Command::Respond { meeting, member, response } => {
            let outcome = engine
                .apply_response(&RespondRequest {
                    meeting_id: meeting,
                    member_id: member,
                    response: response.into(),
                })
                .await?;
            print_json(&outcome)?;
        }
        Command::Reconnect { community, requester, other } => {
            let meeting = engine
                .reconnect(&ReconnectRequest {
                    community_id: community,
                    requester,
                    other,
                })
                .await?;
            print_json(&meeting)?;
        }
        Command::Venue { meeting, venues } => {
            let meeting = engine
                .set_venue(&SetVenueRequest {
                    meeting_id: meeting,
                    venues,
                })
                .await?;
            print_json(&meeting)?;
        }
        Command::Reschedule { meeting, length } => {
            let proposal = engine
                .reschedule(&RescheduleRequest {
                    meeting_id: meeting,
                    meeting_length: length,
                })
                .await?;
            print_json(&proposal)?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenv::dotenv().ok();

    init_logging();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
