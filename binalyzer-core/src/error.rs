use std::io;

pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for template construction, binding and resolution.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("unknown sizing mode {0:?}, expected 'auto', 'fix' or 'stretch'")]
    UnknownSizing(String),

    #[error("unknown addressing mode {0:?}, expected 'relative' or 'absolute'")]
    UnknownAddressing(String),

    #[error("unknown converter {0:?}")]
    UnknownConverter(String),

    #[error("'hint' attribute requires a 'signature' attribute")]
    HintWithoutSignature,

    #[error("'name' attribute cannot be a reference")]
    NameIsReference,

    #[error("malformed reference expression {0:?}")]
    MalformedReference(String),

    #[error("signature mismatch at {path:?}: expected {expected:?}, found {found:?}")]
    SignatureMismatch {
        path: String,
        expected: Vec<u8>,
        found: Vec<u8>,
    },

    #[error("reference to unknown node {0:?}")]
    UnknownReference(String),

    #[error("no provider registered under the name {0:?}")]
    UnknownProvider(String),

    #[error("reference cycle detected while resolving {0:?}")]
    ReferenceCycle(String),

    #[error("recursion limit ({0}) exceeded while resolving the layout")]
    RecursionLimit(usize),

    #[error(transparent)]
    Stream(#[from] io::Error),
}
