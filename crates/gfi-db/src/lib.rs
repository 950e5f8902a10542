use anyhow::{Context, Result};
use gfi_config::ResolvedDatabase;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;

mod store;

pub use store::PgLocationStore;

/// Env var holding the database URL.
pub use gfi_config::DEFAULT_URL_ENV as ENV_DB_URL;
/// The source cursor holds one connection while writes use another.
pub use gfi_config::MIN_MAX_CONNECTIONS as MIN_CONNECTIONS;

/// Connect to Postgres using GFI_DATABASE_URL.
pub async fn connect_from_env() -> Result<PgPool> {
    let url = std::env::var(ENV_DB_URL)
        .with_context(|| format!("missing env var {ENV_DB_URL}"))?;
    connect(&url, gfi_config::DEFAULT_MAX_CONNECTIONS).await
}

/// Connect to Postgres at `url`. `max_connections` is raised to [`MIN_CONNECTIONS`].
pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections.max(MIN_CONNECTIONS))
        .connect(url)
        .await
        .context("failed to connect to Postgres")?;

    Ok(pool)
}

/// Connect to a target resolved from config.
pub async fn connect_resolved(target: &ResolvedDatabase, max_connections: u32) -> Result<PgPool> {
    let options = connect_options(target)?;
    let pool = PgPoolOptions::new()
        .max_connections(max_connections.max(MIN_CONNECTIONS))
        .connect_with(options)
        .await
        .context("failed to connect to Postgres")?;
    Ok(pool)
}

/// Postgres options for a resolved target. Unknown attributes become server runtime parameters.
pub fn connect_options(target: &ResolvedDatabase) -> Result<PgConnectOptions> {
    match target {
        ResolvedDatabase::Url(url) => url
            .parse::<PgConnectOptions>()
            .context("invalid database url"),
        ResolvedDatabase::Parts {
            host,
            port,
            username,
            password,
            schema,
            attributes,
        } => {
            let mut opts = PgConnectOptions::new().host(host).port(*port);
            if let Some(u) = username {
                opts = opts.username(u);
            }
            if let Some(p) = password {
                opts = opts.password(p);
            }
            if let Some(db) = schema {
                opts = opts.database(db);
            }
            let mut server_params = Vec::new();
            for (k, v) in attributes {
                match k.as_str() {
                    "application_name" => opts = opts.application_name(v),
                    "sslmode" => {
                        let mode: PgSslMode = v
                            .parse()
                            .with_context(|| format!("invalid sslmode '{v}'"))?;
                        opts = opts.ssl_mode(mode);
                    }
                    _ => server_params.push((k.as_str(), v.as_str())),
                }
            }
            if !server_params.is_empty() {
                opts = opts.options(server_params);
            }
            Ok(opts)
        }
    }
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

/// Simple status query (connectivity + schema presence).
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as::<_, (i32,)>("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;
    let ok = one == 1;

    Ok(DbStatus {
        ok,
        has_import_table: table_exists(pool, "locations_import").await?,
        has_fleet_locations_table: table_exists(pool, "fleet_locations").await?,
    })
}

async fn table_exists(pool: &PgPool, table: &str) -> Result<bool> {
    let (exists,): (bool,) = sqlx::query_as::<_, (bool,)>(
        r#"
        select exists (
            select 1
            from information_schema.tables
            where table_schema = current_schema() and table_name = $1
        )
        "#,
    )
    .bind(table)
    .fetch_one(pool)
    .await
    .with_context(|| format!("status table-exists query failed: {table}"))?;
    Ok(exists)
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_import_table: bool,
    pub has_fleet_locations_table: bool,
}

/// Pool for DB-backed tests: GFI_DATABASE_URL, migrated.
pub async fn testkit_db_pool() -> Result<PgPool> {
    let pool = connect_from_env().await?;
    migrate(&pool).await?;
    Ok(pool)
}
