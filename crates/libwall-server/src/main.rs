//! libwall server binary.
//!
//! Reads `libwall.toml` (or the path given with `--config`) layered with
//! `LIBWALL_*` environment variables, opens the SQLite store, and serves the
//! JSON API. Operator subcommands inspect walls and maintain user records.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use libwall_core::{
  loader::LoadQuery,
  user::{User, UserId},
  wall::Location,
};
use libwall_server::ServerConfig;
use libwall_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "libwall comment wall server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "libwall.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API over HTTP (the default).
  Serve,
  /// Print a wall, newest comment first, creating it if it does not exist.
  Show {
    #[arg(long)]
    context:   i64,
    #[arg(long)]
    component: String,
    #[arg(long, default_value = "")]
    area:      String,
    #[arg(long, default_value_t = 0)]
    item:      i64,
    /// Only the N most recent comments.
    #[arg(long)]
    count:     Option<i64>,
  },
  /// Create or update a user record.
  AddUser {
    #[arg(long)]
    id:      i64,
    #[arg(long)]
    name:    String,
    #[arg(long)]
    picture: Option<String>,
    /// Guests may read walls but not post.
    #[arg(long)]
    guest:   bool,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  let store_path = server_cfg.resolved_store_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(&server_cfg, store).await,
    Command::Show { context, component, area, item, count } => {
      let location = Location::new(context, component).with_area(area).with_item(item);
      show(&server_cfg, store, &location, count).await
    }
    Command::AddUser { id, name, picture, guest } => {
      store
        .upsert_user(User { id: UserId(id), full_name: name, picture_url: picture, guest })
        .await
        .context("failed to save user")?;
      println!("saved user {id}");
      Ok(())
    }
  }
}

async fn serve(server_cfg: &ServerConfig, store: SqliteStore) -> anyhow::Result<()> {
  let service = Arc::new(server_cfg.build_service(Arc::new(store)));
  let app = libwall_server::router(service);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn show(
  server_cfg: &ServerConfig,
  store: SqliteStore,
  location: &Location,
  count: Option<i64>,
) -> anyhow::Result<()> {
  let service = server_cfg.build_service(Arc::new(store));
  let wall = service
    .resolve_or_create(location)
    .await
    .with_context(|| format!("failed to resolve wall at {location}"))?;

  let query = count.map_or(LoadQuery::all(), LoadQuery::latest);
  let view = service.load(wall, query).await.context("failed to load comments")?;

  let wall = view.handle();
  println!("wall {} at {} ({} comments shown)", wall.id(), wall.wall.location, view.len());
  for c in view.comments() {
    println!(
      "#{} {} {}: {}",
      c.seq_num(),
      c.comment.time_created.to_rfc3339(),
      c.author.full_name,
      c.comment.content
    );
    for r in &c.replies {
      println!(
        "    {} {}: {}",
        r.reply.time_created.to_rfc3339(),
        r.author.full_name,
        r.reply.content
      );
    }
  }

  Ok(())
}
