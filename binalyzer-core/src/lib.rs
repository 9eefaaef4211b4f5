//! A declarative binary-layout engine: an XML-described tree of regions
//! whose offset, size and value are resolved lazily against a byte stream.

mod binding;
mod converter;
mod error;
mod node;
mod orchestrator;
mod property;
mod registry;
mod resolver;
mod stream;

pub use binding::BindingContext;
pub use converter::{decode_leb128, encode_leb128, ByteOrder, Converter};
pub use error::{Error, Result};
pub use node::Template;
pub use orchestrator::Binalyzer;
pub use property::{AddressingMode, Property, ProviderKind, Sizing, Target};
pub use registry::{ProviderFn, Registry};
pub use stream::{ByteStream, DataStream};
