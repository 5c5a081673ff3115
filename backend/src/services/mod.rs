pub mod account;
pub mod account_cache;
pub mod audit_log;
pub mod credentials;
pub mod session;
pub mod token;

pub use account::AccountService;
pub use account_cache::AccountCache;
pub use audit_log::{spawn_record, AuditSink, PgAuditSink, TracingAuditSink};
pub use credentials::Credentials;
pub use session::{DroppedSession, SessionService, StartedSession};
pub use token::{TokenPair, TokenService, TokenSettings};
