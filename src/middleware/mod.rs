pub mod auth;
pub mod extract;

pub use auth::RequireConsoleKey;
pub use extract::{ApiJson, ApiPath};
