use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Client with id {0} was not found")]
    NotFound(i32),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
