use sea_orm_migration::MigratorTrait;
use tracing::info;

use inventory_api::migrator::{connect_for_migrations, Migrator};

const USAGE: &str = "usage: migration [up|down|fresh|status]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let command = std::env::args().nth(1).unwrap_or_else(|| "up".to_string());

    let database_url = std::env::var("DATABASE_URL")
        .or_else(|_| std::env::var("APP__DATABASE_URL"))
        .unwrap_or_else(|_| "sqlite://inventory.db?mode=rwc".to_string());

    info!("Connecting to database: {}", database_url);
    let db = connect_for_migrations(&database_url).await?;

    match command.as_str() {
        "up" => {
            Migrator::up(&db, None).await?;
            info!("Schema is up to date");
        }
        "down" => {
            Migrator::down(&db, None).await?;
            info!("All migrations reverted");
        }
        "fresh" => {
            Migrator::fresh(&db).await?;
            info!("Schema rebuilt from scratch");
        }
        "status" => {
            Migrator::status(&db).await?;
        }
        other => anyhow::bail!("unknown command `{}`; {}", other, USAGE),
    }

    Ok(())
}
