//! CLI command implementations.
//!
//! | Module  | Commands handled        |
//! |---------|-------------------------|
//! | `serve` | `Serve`                 |
//! | `db`    | `InitDb`, `SeedAdmin`   |

pub mod db;
pub mod serve;

pub use db::{cmd_init_db, cmd_seed_admin};
pub use serve::cmd_serve;
