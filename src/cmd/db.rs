//! Database maintenance commands: `init-db` and `seed-admin`.

use std::path::Path;

use anyhow::Result;
use project_board::config::AppConfig;
use project_board::seed::seed_admin;
use project_board::server::open_database;
use project_board::store::DbHandle;

pub fn cmd_init_db(db_path: &Path) -> Result<()> {
    open_database(db_path)?;
    println!("Database initialized at {}", db_path.display());
    Ok(())
}

pub async fn cmd_seed_admin(config: &AppConfig) -> Result<()> {
    let db = DbHandle::new(open_database(&config.database_path)?);
    let (user, created) = seed_admin(&db, &config.admin).await?;
    if created {
        println!("Created admin user {}", user.email);
    } else {
        println!("Admin user {} already exists", user.email);
    }
    Ok(())
}
