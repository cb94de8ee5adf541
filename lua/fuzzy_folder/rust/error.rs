use std::io;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} reported an error: {message}")]
    Stderr { program: String, message: String },
    #[error("I/O error while talking to {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("Filter request was superseded")]
    Cancelled,
    #[error("Folder picker is not open")]
    NotPicking,
    #[error("Folder picker is not initialized, call setup() first")]
    NotInitialized,
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Lock poisoned: {0}")]
    Poisoned(&'static str),
}

impl Error {
    pub(crate) fn io(program: &str, source: io::Error) -> Self {
        Error::Io {
            program: program.to_string(),
            source,
        }
    }

    /// Errors that describe misuse by the caller rather than a failing tool.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Error::NotPicking
                | Error::NotInitialized
                | Error::InvalidConfig(_)
                | Error::InvalidPath(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(feature = "nvim")]
impl From<Error> for mlua::Error {
    fn from(err: Error) -> Self {
        mlua::Error::RuntimeError(err.to_string())
    }
}
