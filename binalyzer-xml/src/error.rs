pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("malformed XML document: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error(transparent)]
    Core(#[from] binalyzer_core::Error),

    #[error("unknown attribute value {value:?} for '{attribute}' on <{element}>")]
    UnknownAttributeValue {
        element: String,
        attribute: String,
        value: String,
    },

    #[error("'hint' attribute requires a 'signature' attribute on <{element}>")]
    HintWithoutSignature { element: String },

    #[error("'name' attribute cannot be a reference on <{element}>")]
    NameIsReference { element: String },

    #[error("malformed reference expression {0:?}")]
    MalformedReference(String),

    #[error("malformed signature value {0:?}, expected even-length 0x hex")]
    MalformedSignature(String),

    #[error("signature mismatch on node {name:?}")]
    SignatureMismatch { name: String },

    #[error("count attribute {0:?} could not be evaluated at build time (only integer literals are supported)")]
    UnsupportedCount(String),
}
