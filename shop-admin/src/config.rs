//! Command line and environment configuration.

use crate::sql::{
    db::postgres::{self, Config},
    PostgresDataSource,
};
use clap::Args;
use derivative::Derivative;
use std::time::Duration;

/// Options for connecting to the PostgreSQL database.
#[derive(Args, Clone, Derivative)]
#[derivative(Debug)]
pub struct DbOptions {
    /// Database server host.
    #[arg(long = "db-host", env = "DB_HOST", default_value = "localhost")]
    pub host: String,

    /// Database server port.
    #[arg(id = "db_port", long = "db-port", env = "DB_PORT", default_value_t = 5432)]
    pub port: u16,

    /// Database user.
    #[arg(long = "db-user", env = "DB_USER", default_value = "postgres")]
    pub user: String,

    /// Database password.
    #[arg(
        long = "db-password",
        env = "DB_PASSWORD",
        default_value = "",
        hide_env_values = true
    )]
    #[derivative(Debug = "ignore")]
    pub password: String,

    /// Name of the shop database.
    #[arg(long = "db-name", env = "DB_NAME", default_value = "shop_shine")]
    pub name: String,
}

impl DbOptions {
    /// The PostgreSQL connection parameters described by these options.
    pub fn config(&self) -> Config {
        let mut config = Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .user(&self.user)
            .dbname(&self.name)
            .connect_timeout(Duration::from_secs(5));
        if !self.password.is_empty() {
            config.password(&self.password);
        }
        config
    }

    /// A data source which connects to the database on first use, and reconnects after losing the
    /// connection.
    pub fn data_source(&self) -> PostgresDataSource {
        postgres::Connection::lazy(self.config()).into()
    }

    /// Connect to the database, failing if it is unreachable.
    pub async fn connect(&self) -> Result<PostgresDataSource, postgres::Error> {
        tracing::info!(
            "connecting to PostgreSQL database {} at {}:{}",
            self.name,
            self.host,
            self.port
        );
        Ok(postgres::Connection::new(self.config()).await?.into())
    }
}

/// Options for the HTTP server.
#[derive(Args, Clone, Debug)]
pub struct ServeOptions {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 4000)]
    pub port: u16,

    /// Serve a migrated and seeded in-memory database instead of connecting to PostgreSQL.
    #[cfg(feature = "mocks")]
    #[arg(long)]
    pub in_memory: bool,
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::{CommandFactory, Parser};

    #[derive(Debug, Parser)]
    struct Cli {
        #[command(flatten)]
        db: DbOptions,
        #[command(flatten)]
        serve: ServeOptions,
    }

    #[test]
    fn test_argument_ids_unique() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from([
            "shop-admin",
            "--db-host",
            "db.internal",
            "--db-port",
            "6543",
            "--db-password",
            "hunter2",
            "--port",
            "8080",
        ])
        .unwrap();
        assert_eq!(cli.db.host, "db.internal");
        assert_eq!(cli.db.port, 6543);
        assert_eq!(cli.db.password, "hunter2");
        assert_eq!(cli.serve.port, 8080);
    }

    #[test]
    fn test_password_hidden() {
        let cli = Cli::try_parse_from(["shop-admin", "--db-password", "hunter2"]).unwrap();
        let debug = format!("{:?}", cli.db);
        assert!(debug.contains("host"));
        assert!(!debug.contains("hunter2"));
    }
}
