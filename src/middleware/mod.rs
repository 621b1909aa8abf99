/// Middleware module
///
/// Bearer-token enforcement for protected scopes and request logging.

mod bearer;
mod logging;

pub use bearer::BearerAuth;
pub use logging::RequestLogger;
