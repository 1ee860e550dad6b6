use clap::{Parser, Subcommand};
use shop_admin::{
    config::{DbOptions, ServeOptions},
    graphql::{self, Store},
    init_logging, server,
    sql::{migrations::Migrator, seed},
};

/// Back-office GraphQL API for the shop database.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    #[command(flatten)]
    db: DbOptions,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the GraphQL API over HTTP.
    Serve(ServeOptions),
    /// Manage the database schema.
    #[command(subcommand)]
    Migrate(Migrate),
    /// Replace the contents of the database with sample data.
    Seed,
    /// Print the GraphQL schema.
    Schema,
}

#[derive(Debug, Subcommand)]
enum Migrate {
    /// Apply all pending migrations.
    Latest,
    /// Revert the most recently applied migration.
    Rollback {
        /// Revert every applied migration.
        #[arg(long)]
        all: bool,
    },
    /// List migrations and whether they have been applied.
    Status,
}

async fn serve(db: DbOptions, opt: ServeOptions) -> color_eyre::Result<()> {
    #[cfg(feature = "mocks")]
    if opt.in_memory {
        tracing::warn!("serving an in-memory database; changes will not be saved");
        return server::run(Store::new(seed::in_memory().await?), opt.port).await;
    }
    server::run(Store::new(db.data_source()), opt.port).await
}

async fn migrate(db: DbOptions, cmd: Migrate) -> color_eyre::Result<()> {
    let db = db.connect().await?;
    let migrator = Migrator::new(db.inner());
    match cmd {
        Migrate::Latest => {
            let applied = migrator.latest().await?;
            if applied.is_empty() {
                println!("Already up to date");
            }
            for migration in applied {
                println!("Applied {} {}", migration.version, migration.name);
            }
        }
        Migrate::Rollback { all } => {
            let reverted = migrator.rollback(all).await?;
            if reverted.is_empty() {
                println!("Already at the base migration");
            }
            for migration in reverted {
                println!("Rolled back {} {}", migration.version, migration.name);
            }
        }
        Migrate::Status => {
            for status in migrator.status().await? {
                let state = if status.applied { "applied" } else { "pending" };
                println!("{} {:<32} {state}", status.version, status.name);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(opt) => serve(cli.db, opt).await,
        Command::Migrate(cmd) => migrate(cli.db, cmd).await,
        Command::Seed => {
            seed::run(&cli.db.connect().await?).await?;
            println!("Seeded {} tables", seed::TABLES.len());
            Ok(())
        }
        Command::Schema => {
            print!("{}", graphql::sdl());
            Ok(())
        }
    }
}
