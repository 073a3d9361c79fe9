use glasspane_common::PgConfig;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

/// Open a single-connection pool for a one-shot import.
pub async fn connect(config: &PgConfig) -> Result<PgPool, sqlx::Error> {
    let options = match config {
        PgConfig::Url(url) => url.parse::<PgConnectOptions>()?,
        PgConfig::Params {
            host,
            port,
            user,
            password,
            database,
        } => PgConnectOptions::new()
            .host(host)
            .port(*port)
            .username(user)
            .password(password)
            .database(database),
    };

    PgPoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
}
