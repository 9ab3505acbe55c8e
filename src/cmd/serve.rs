//! HTTP server command: `project-board serve`.

use anyhow::Result;
use project_board::config::AppConfig;
use project_board::server::{ServerConfig, start_server};

pub async fn cmd_serve(config: AppConfig, seed_admin: bool, dev: bool) -> Result<()> {
    start_server(
        ServerConfig {
            port: config.port,
            db_path: config.database_path,
            seed_admin,
            dev_mode: dev,
        },
        &config.admin,
    )
    .await
}
