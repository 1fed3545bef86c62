pub mod auth;
pub mod logging;
pub mod rate_limit;

pub use auth::*;
pub use logging::*;
pub use rate_limit::*;
