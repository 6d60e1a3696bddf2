use crate::entities::{countries, currencies, invoices, producers};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::env;
use std::time::Duration;
use tracing::info;

pub async fn setup_database() -> anyhow::Result<DatabaseConnection> {
    let db_url = env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

    info!("📂 Database: {}", db_url);

    let mut opt = ConnectOptions::new(&db_url);
    opt.max_connections(20)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db = Database::connect(opt).await?;

    info!("✅ Database connected successfully");

    run_migrations(&db).await?;
    super::seed::seed_reference_data(&db).await?;

    Ok(db)
}

pub async fn run_migrations(db: &DatabaseConnection) -> anyhow::Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    info!("🔄 Running auto-migrations...");

    // Referenced tables first: currencies -> countries, producers -> invoices
    let stmts = vec![
        (
            "currencies",
            schema
                .create_table_from_entity(currencies::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "countries",
            schema
                .create_table_from_entity(countries::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "producers",
            schema
                .create_table_from_entity(producers::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "invoices",
            schema
                .create_table_from_entity(invoices::Entity)
                .if_not_exists()
                .to_owned(),
        ),
    ];

    for (name, stmt) in stmts {
        let stmt = builder.build(&stmt);
        db.execute(stmt)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create table '{}': {}", name, e))?;
        info!("   - Table '{}' checked/created", name);
    }

    for index in [
        "CREATE INDEX IF NOT EXISTS idx_invoices_producer_id ON invoices(producer_id)",
        "CREATE INDEX IF NOT EXISTS idx_countries_currency_id ON countries(currency_id)",
    ] {
        if let Err(e) = db
            .execute(sea_orm::Statement::from_string(builder, index.to_string()))
            .await
        {
            tracing::warn!("   - Index creation warning: {} -> {}", index, e);
        }
    }

    Ok(())
}
