mod config;
mod error;
mod store;

pub use config::SqliteConfig;
pub use error::{SqliteDaoError, SqliteResult};
pub use store::SqliteCodesStore;

use crate::dao::storage::StorageError;

impl From<SqliteDaoError> for StorageError {
    fn from(err: SqliteDaoError) -> Self {
        StorageError::backend("sqlite", err)
    }
}
