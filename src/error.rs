pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Redb(#[from] redb::Error),

    #[error("database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("database storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("database transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("database table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("database commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("user id must not be blank")]
    InvalidUserId,

    #[error("no files provided for new user '{0}'")]
    NoFilesProvided(String),

    #[error("no documents processed yet for this user")]
    SessionNotReady,

    #[error("user '{0}' is the active user and cannot be deleted")]
    UserIsActive(String),

    #[error("failed to extract text from '{name}': {reason}")]
    Extract { name: String, reason: String },

    #[error("index error: {0}")]
    Index(String),

    #[error("configuration error: {0}")]
    Config(String),
}
