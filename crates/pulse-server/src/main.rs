// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pulse analytics ingestion server binary.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use pulse_server::admin::{self, NewProject};
use pulse_server::{create_app_state, create_router, ServerConfig};
use pulse_server_config::LogFormat;
use pulse_server_db::DirectoryRepository;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Pulse server - multi-tenant analytics ingestion.
#[derive(Parser, Debug)]
#[command(name = "pulse-server", about = "Pulse analytics ingestion server", version)]
struct Args {
	/// Path to a TOML config file (defaults to /etc/pulse/server.toml)
	#[arg(long, global = true, env = "PULSE_SERVER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Run migrations and start the HTTP server (default)
	Serve,
	/// Run database migrations and exit
	Migrate,
	/// Manage organizations
	Org {
		#[command(subcommand)]
		command: OrgCommand,
	},
	/// Manage projects
	Project {
		#[command(subcommand)]
		command: ProjectCommand,
	},
	/// Show version information
	Version,
}

#[derive(Subcommand, Debug)]
enum OrgCommand {
	/// Register an organization
	Create {
		#[arg(long)]
		name: String,
		#[arg(long)]
		slug: String,
		#[arg(long)]
		domain: Option<String>,
	},
}

#[derive(Subcommand, Debug)]
enum ProjectCommand {
	/// Register a project under an organization
	Create(ProjectCreateArgs),
	/// List an organization's projects
	List {
		/// Organization id or slug
		#[arg(long)]
		org: String,
	},
}

#[derive(ClapArgs, Debug)]
struct ProjectCreateArgs {
	/// Organization id or slug
	#[arg(long)]
	org: String,
	#[arg(long)]
	tracking_code: Option<String>,
	#[arg(long)]
	domain: Option<String>,
	/// Mark as the operator's own site
	#[arg(long)]
	operator: bool,
	/// Do not accept tracking calls addressed to this project directly
	#[arg(long)]
	no_tenant: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("pulse-server version: {}", env!("CARGO_PKG_VERSION"));
		return Ok(());
	}

	// Load .env file if present
	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => pulse_server_config::load_config_with_file(path)?,
		None => pulse_server_config::load_config()?,
	};

	init_tracing(&config);

	let pool = pulse_server_db::create_pool(&config.database.url).await?;
	pulse_server_db::run_migrations(&pool).await?;

	match args.command.unwrap_or(Command::Serve) {
		Command::Serve => serve(pool, &config).await?,
		Command::Migrate => {
			tracing::info!(database = %config.database.url, "migrations applied");
		}
		Command::Org {
			command: OrgCommand::Create { name, slug, domain },
		} => {
			let directory = DirectoryRepository::new(pool);
			let org = admin::create_organization(&directory, &name, &slug, domain).await?;
			println!("{}", org.id);
		}
		Command::Project { command } => {
			let directory = DirectoryRepository::new(pool);
			match command {
				ProjectCommand::Create(create) => {
					let project = admin::create_project(
						&directory,
						&create.org,
						NewProject {
							tracking_code: create.tracking_code,
							domain: create.domain,
							is_tenant: !create.no_tenant,
							is_operator_site: create.operator,
						},
					)
					.await?;
					println!("{}", admin::format_project(&project));
				}
				ProjectCommand::List { org } => {
					for project in admin::list_projects(&directory, &org).await? {
						println!("{}", admin::format_project(&project));
					}
				}
			}
		}
		Command::Version => println!("pulse-server version: {}", env!("CARGO_PKG_VERSION")),
	}

	Ok(())
}

fn init_tracing(config: &ServerConfig) {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| config.logging.level.clone().into());
	let registry = tracing_subscriber::registry().with(filter);

	match config.logging.format {
		LogFormat::Json => registry
			.with(tracing_subscriber::fmt::layer().json())
			.init(),
		LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
	}
}

async fn serve(
	pool: sqlx::SqlitePool,
	config: &ServerConfig,
) -> Result<(), Box<dyn std::error::Error>> {
	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		"starting pulse-server"
	);

	let state = create_app_state(pool.clone(), config);
	let app = create_router(state);

	let addr = config.socket_addr();
	tracing::info!("listening on {}", addr);

	let listener = tokio::net::TcpListener::bind(&addr).await?;

	// Run server with graceful shutdown
	tokio::select! {
		result = axum::serve(listener, app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "Server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Received shutdown signal");
		}
	}

	pool.close().await;
	tracing::info!("Server shutdown complete");
	Ok(())
}
