pub mod api;
pub mod config;
pub mod db;
pub mod storage;

pub use db::DbPool;

use config::Config;
use storage::UploadStore;

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub uploads: UploadStore,
}

impl AppState {
    pub fn new(config: Config, db: DbPool, uploads: UploadStore) -> Self {
        Self {
            config,
            db,
            uploads,
        }
    }
}
