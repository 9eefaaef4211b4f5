//! Property variants bound to a node's offset/size/boundary/padding/value
//! slots (spec §4.2).

use crate::converter::Converter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Relative,
    Absolute,
}

impl Default for AddressingMode {
    fn default() -> Self {
        AddressingMode::Relative
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sizing {
    Fix,
    Auto,
    Stretch,
}

impl Default for Sizing {
    fn default() -> Self {
        Sizing::Auto
    }
}

/// Which node a `Provider` property runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The node that owns the property.
    SelfNode,
    /// Another node, looked up by name (spec §4.2 "Reference").
    Named(String),
}

/// How a `Provider` property turns (stream, target address) into an integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderKind {
    /// Reads the target's resolved `value` bytes and decodes them.
    /// This is the plain "Reference" property of spec §4.2.
    StreamRead(Converter),
    /// Scans forward from the target's absolute address counting LEB128
    /// continuation bytes; the byte count *is* the value (used for a
    /// self-referential `size` slot whose own size isn't known yet).
    Leb128Size,
    /// Scans forward from the target's absolute address and decodes an
    /// unsigned LEB128 integer.
    Leb128Value,
    /// Dispatches into a closure registered in the extension `Registry`.
    Custom(String),
}

/// A lazily evaluated slot: offset, size, boundary or padding (spec §4.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Property {
    /// A literal constant, parsed once at bind time.
    Literal(i128),
    /// Dispatches to a provider against a target node.
    Provider { target: Target, kind: ProviderKind },
    /// Default offset: previous sibling's extent, or 0 for a first child.
    RelativeOffset,
    /// Default size when `sizing="auto"`: bounding extent of children.
    AutoSize,
    /// Default size when `sizing="stretch"`: fills remaining parent space.
    StretchSize,
}

impl Default for Property {
    fn default() -> Self {
        Property::Literal(0)
    }
}

impl Property {
    pub fn literal(value: impl Into<i128>) -> Self {
        Property::Literal(value.into())
    }

    pub fn reference(name: impl Into<String>, converter: Converter) -> Self {
        Property::Provider {
            target: Target::Named(name.into()),
            kind: ProviderKind::StreamRead(converter),
        }
    }
}
