use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::auth::token::TokenIssuer;
use crate::config::Config;
use crate::db;
use crate::media::{CloudinaryHost, MediaHost, MediaUploader};
use crate::store::{ContentStore, CredentialStore};

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: CredentialStore,
    pub content: ContentStore,
    pub tokens: Arc<TokenIssuer>,
    pub media: MediaUploader,
}

impl AppState {
    /// Wire every component from an already-open pool and a media host.
    pub fn new(config: Config, db: DbPool, jwt_secret: &str, host: Arc<dyn MediaHost>) -> Self {
        Self {
            users: CredentialStore::new(db.clone(), config.auth.bcrypt_cost),
            content: ContentStore::new(db),
            tokens: Arc::new(TokenIssuer::new(jwt_secret, config.auth.token_hours)),
            media: MediaUploader::new(host),
            config: Arc::new(config),
        }
    }

    /// Production wiring: open the database, run migrations, build the Cloudinary client.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let required = config.required()?;

        let pool = db::create_pool_from_url(required.database_url)?;
        db::run_migrations(&pool)?;

        let host = CloudinaryHost::new(
            &config.media.api_base,
            required.cloud_name,
            required.api_key,
            required.api_secret,
            &config.media.folder,
        );
        let jwt_secret = required.jwt_secret.to_string();

        Ok(Self::new(config, pool, &jwt_secret, Arc::new(host)))
    }
}
