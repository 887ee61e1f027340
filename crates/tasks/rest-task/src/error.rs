use std::{io, time::Duration};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RestError {
    #[error("failed to bind REST listener on {addr}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("REST service run before init")]
    NotInitialized,

    #[error("REST server stopped with an error")]
    Serve(#[source] io::Error),

    #[error("REST server task ended abnormally")]
    Join(#[source] tokio::task::JoinError),

    #[error("in-flight connections not drained within {timeout:?}")]
    DrainTimeout { timeout: Duration },
}
