/// Middleware module.
///
/// Request verification (identity establishment) and request logging.

mod authentication;
mod request_logger;

pub use authentication::{Authenticated, AuthenticationMiddleware, CurrentAccount};
pub use request_logger::RequestLogger;
