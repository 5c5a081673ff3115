use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    config::Config,
    middleware::{BearerTokenResolver, IdentityResolver, SessionCookieResolver},
    repositories::{
        memory::{
            InMemoryAccountRepository, InMemoryCookieSessionRepository,
            InMemoryRefreshSessionRepository, InMemoryUserRepository,
        },
        AccountRepository, CookieSessionRepository, PgAccountRepository,
        PgCookieSessionRepository, PgRefreshSessionRepository, PgUserRepository,
        RefreshSessionRepository, UserRepository,
    },
    services::{
        AccountCache, AccountService, AuditSink, Credentials, PgAuditSink, SessionService,
        TokenService, TracingAuditSink,
    },
    utils::{Argon2Hasher, Clock, SystemClock},
};

/// Storage backends behind every service.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserRepository>,
    pub refresh_sessions: Arc<dyn RefreshSessionRepository>,
    pub cookie_sessions: Arc<dyn CookieSessionRepository>,
    pub accounts: Arc<dyn AccountRepository>,
    pub audit: Arc<dyn AuditSink>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            refresh_sessions: Arc::new(PgRefreshSessionRepository::new(pool.clone())),
            cookie_sessions: Arc::new(PgCookieSessionRepository::new(pool.clone())),
            accounts: Arc::new(PgAccountRepository::new(pool.clone())),
            audit: Arc::new(PgAuditSink::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            refresh_sessions: Arc::new(InMemoryRefreshSessionRepository::new()),
            cookie_sessions: Arc::new(InMemoryCookieSessionRepository::new()),
            accounts: Arc::new(InMemoryAccountRepository::new()),
            audit: Arc::new(TracingAuditSink),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tokens: TokenService,
    pub sessions: SessionService,
    pub accounts: AccountService,
    /// Tried in order by the authorization middleware.
    pub resolvers: Arc<[Arc<dyn IdentityResolver>]>,
    pub audit: Arc<dyn AuditSink>,
}

impl AppState {
    pub fn new(config: Config, stores: Stores) -> Self {
        Self::with_clock(config, stores, Arc::new(SystemClock))
    }

    pub fn with_clock(config: Config, stores: Stores, clock: Arc<dyn Clock>) -> Self {
        let credentials = Credentials::new(
            stores.users,
            Arc::new(Argon2Hasher::new()),
            Arc::clone(&clock),
        );
        let tokens = TokenService::new(
            credentials.clone(),
            stores.refresh_sessions,
            config.jwt_secret.as_bytes(),
            config.token_settings(),
            Arc::clone(&clock),
        );
        let sessions = SessionService::new(
            credentials,
            stores.cookie_sessions,
            config.session_secret.as_bytes(),
            config.session_ttl(),
            config.cookie_options(),
            Arc::clone(&clock),
        );
        let accounts = AccountService::new(
            stores.accounts,
            AccountCache::new(config.cache_ttl(), Arc::clone(&clock)),
            clock,
        );
        let resolvers: Vec<Arc<dyn IdentityResolver>> = vec![
            Arc::new(BearerTokenResolver::new(tokens.clone())),
            Arc::new(SessionCookieResolver::new(sessions.clone())),
        ];

        Self {
            config: Arc::new(config),
            tokens,
            sessions,
            accounts,
            resolvers: resolvers.into(),
            audit: stores.audit,
        }
    }
}
