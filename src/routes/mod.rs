mod account;
mod auth;
mod health_check;

pub use account::me;
pub use auth::{login, logout, refresh, register};
pub use health_check::health_check;
