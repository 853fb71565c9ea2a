use api::{Config, build, telemetry::{get_subscriber, init_subscriber}};
use ledger::TimeSource;

/// Bonus-points ledger API server.
///
/// Environment variables can be set directly or loaded from a .env file in
/// the project root.
///
/// Required:
/// - DATABASE_URL: PostgreSQL connection string
/// - IP_ADDRESS: server bind address (127.0.0.1 for local, 0.0.0.0 for public)
/// - PORT: server port
///
/// Optional:
/// - ALLOWED_ORIGINS: CORS origins ("*" for any origin, or a comma-separated list)
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenvy::dotenv();

    let subscriber = get_subscriber("info".into());
    init_subscriber(subscriber);

    let mut config = Config::from_env();

    let pool = sqlx::PgPool::connect(&config.database_url).await.unwrap();
    sqlx::migrate!("../ledger/migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    #[cfg(not(feature = "mock-time"))]
    let time_source = TimeSource::new();
    #[cfg(feature = "mock-time")]
    let time_source = TimeSource::new(jiff::Timestamp::now());

    let server = build(&mut config, time_source).await?;
    server.await
}
