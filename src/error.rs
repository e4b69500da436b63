use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

/// Failures that stop the command. A video that fails to load is not one of
/// them: it is logged and the others carry on.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("configuration error")]
    Config,
    #[display("local store could not be opened")]
    Store,
    #[display("video source could not be set up")]
    Source,
    #[display("{_0}")]
    InvalidArgument(#[error(not(source))] String),
    #[display("video {_0} could not be loaded")]
    Load(#[error(not(source))] String),
    #[display("page export failed")]
    Export,
}
