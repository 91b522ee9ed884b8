pub mod database;
pub mod jwt;
pub mod metrics;
pub mod prompt;
pub mod providers;

pub use database::Database;
pub use jwt::{AccessTokenClaims, JwtService};
pub use prompt::PromptService;
