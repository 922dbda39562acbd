use std::path::PathBuf;

/// Errors raised by the library. Everything except `Config` is local to a
/// single actor's run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error ({}): {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("snapshot I/O error ({}): {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot {} is not valid JSON: {source}", .path.display())]
    SnapshotCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("steam api error: {0}")]
    Provider(String),

    #[error("login failed for {handle}: {message}")]
    Auth { handle: String, message: String },

    #[error("post failed: {0}")]
    Publish(String),
}

pub type Result<T> = std::result::Result<T, Error>;
