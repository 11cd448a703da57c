use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::auth::SessionResolver;
use crate::config::Config;
use crate::feed::FeedAssembler;
use crate::reactions::ReactionEngine;
use crate::repository::SqliteStore;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub sessions: SessionResolver,
    pub reactions: ReactionEngine,
    pub feed: FeedAssembler,
}

impl AppState {
    /// Wire every service onto one SQLite store.
    pub fn new(db: DbPool, config: Config) -> Self {
        let store = Arc::new(SqliteStore::new(db));
        let sessions = SessionResolver::new(store.clone(), store.clone());
        let reactions = ReactionEngine::new(store.clone());
        let feed = FeedAssembler::new(reactions.clone(), store.clone());

        Self {
            config,
            store,
            sessions,
            reactions,
            feed,
        }
    }
}
