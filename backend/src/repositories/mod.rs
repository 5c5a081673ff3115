pub mod account;
pub mod audit_log;
pub mod cookie_session;
pub mod memory;
pub mod refresh_session;
pub mod user;

pub use account::*;
pub use cookie_session::*;
pub use refresh_session::*;
pub use user::*;
