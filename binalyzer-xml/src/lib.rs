//! XML attribute binder: builds a [`Template`] tree from a declarative
//! layout document (spec §4.5, §6).
//!
//! Grounded in `binalyzer_template_provider/xml.py`'s `XMLTemplateParser`
//! (`examples/original_source/`), generalized from ANTLR-generated parse
//! events (out of scope per spec §1) onto a `roxmltree::Document`: each
//! element is visited in document order, the same way `enterElement`
//! walks the ANTLR parse tree.

mod error;

pub use error::{Error, Result};

use std::cell::RefCell;
use std::rc::Rc;

use binalyzer_core::{
    AddressingMode, Binalyzer, ByteOrder, ByteStream, Converter, DataStream, Property,
    ProviderKind, Sizing, Target, Template,
};

const DEFAULT_ADDRESSING_MODE: &str = "relative";
const DEFAULT_SIZING: &str = "auto";

/// Parses `xml` into a detached template tree with no bound data stream.
pub fn parse(xml: &str) -> Result<Template> {
    XmlTemplateParser::new(xml)?.parse()
}

/// Parses `xml` and binds the resulting tree against `data` (spec §6's
/// `parse(template_text, data_bytes?) -> root` entry point).
pub fn parse_with_data(xml: &str, data: Vec<u8>) -> Result<Binalyzer> {
    let template = parse(xml)?;
    let stream: Rc<RefCell<dyn DataStream>> = Rc::new(RefCell::new(ByteStream::real(data)));
    Ok(Binalyzer::new(template, stream))
}

/// Loads a template document (and optional data file) from the
/// filesystem (spec §6's `load_from(paths_or_urls) -> root`; file/URL
/// I/O proper is out of scope per spec §1 — this is the thin loader).
pub fn load_from(template_path: &str, data_path: Option<&str>) -> Result<Binalyzer> {
    let xml = std::fs::read_to_string(template_path).map_err(binalyzer_core::Error::from)?;
    let data = match data_path {
        Some(path) => std::fs::read(path).map_err(binalyzer_core::Error::from)?,
        None => Vec::new(),
    };
    parse_with_data(&xml, data)
}

/// Walks a `roxmltree::Document` in document order, binding recognized
/// attributes (§6) onto the [`Property`] model of each [`Template`] node
/// it creates.
pub struct XmlTemplateParser<'a> {
    document: roxmltree::Document<'a>,
}

impl<'a> XmlTemplateParser<'a> {
    pub fn new(xml: &'a str) -> Result<Self> {
        let document = roxmltree::Document::parse(xml.trim())?;
        Ok(XmlTemplateParser { document })
    }

    /// Builds the template tree. Returns an error if the root element
    /// itself is dropped by a failing, non-optional signature check, or
    /// is optional and fails (there being no parent to drop it from).
    pub fn parse(&self) -> Result<Template> {
        let root_element = self.document.root_element();
        build_element(&root_element, None)?
            .ok_or_else(|| Error::MalformedReference("root element was dropped".to_string()))
    }
}

/// Builds one element (and its subtree) in document order. `parent` is
/// `None` for the document root. Returns `Ok(None)` when the node carried
/// a `signature` that mismatched and `hint="optional"` silently drops it
/// (spec §4.4) — the caller must not link a `None` into its children.
fn build_element(element: &roxmltree::Node<'_, '_>, parent: Option<&Template>) -> Result<Option<Template>> {
    let template = Template::new();
    if let Some(parent) = parent {
        parent.attach(&template);
        // Provisionally list the node among its parent's children *before*
        // attributes are parsed and the signature check below runs, so the
        // default relative-offset computation (which locates the previous
        // sibling by searching `parent.children()`) sees this node at its
        // real position instead of falling through to "no previous
        // sibling". Retracted again if the signature check drops the node,
        // or if `count` replaces it with clones.
        parent.append_child(&template);
    }

    parse_sizing_attribute(element, &template)?;
    parse_name_attribute(element, &template)?;
    parse_offset_attribute(element, &template)?;
    parse_size_attribute(element, &template)?;
    parse_padding_attribute(element, &template, "padding-before")?;
    parse_padding_attribute(element, &template, "padding-after")?;
    parse_boundary_attribute(element, &template)?;
    parse_text(element, &template)?;
    parse_signature_attribute(element, &template)?;
    let hint_optional = parse_hint_attribute(element, &template)?;
    let count = parse_count_attribute(element)?;

    log::debug!(
        "bound element <{}> name={:?}",
        element.tag_name().name(),
        template.name()
    );

    if !check_signature_or_drop(&template, hint_optional)? {
        log::debug!(
            "dropping optional node {:?}: signature mismatch",
            template.name()
        );
        if let Some(parent) = parent {
            parent.remove_child(&template);
        }
        return Ok(None);
    }

    // Recurse before materializing `count`: clones must carry their own
    // children (spec §4.3 "Count attribute"), so the prototype's subtree
    // has to exist before `clone_detached` copies it.
    for child in element.children().filter(|n| n.is_element()) {
        build_element(&child, Some(&template))?;
    }

    match (parent, count) {
        (Some(parent), Some(k)) => {
            parent.remove_child(&template);
            for _ in 0..k {
                parent.add_child(&template.clone_detached());
            }
            Ok(None)
        }
        (Some(_), None) => Ok(Some(template)),
        (None, Some(_)) => Err(Error::UnsupportedCount(
            "count is not supported on the document root".to_string(),
        )),
        (None, None) => Ok(Some(template)),
    }
}

fn check_signature_or_drop(template: &Template, hint_optional: bool) -> Result<bool> {
    if template.signature().is_none() {
        return Ok(true);
    }
    let matches = template.check_signature()?;
    if matches {
        return Ok(true);
    }
    if hint_optional {
        return Ok(false);
    }
    Err(Error::SignatureMismatch {
        name: template.name().unwrap_or_else(|| "<anonymous>".to_string()),
    })
}

fn attr<'a>(element: &roxmltree::Node<'a, 'a>, name: &str) -> Option<&'a str> {
    element.attribute(name)
}

fn parse_sizing_attribute(element: &roxmltree::Node<'_, '_>, template: &Template) -> Result<()> {
    let raw = attr(element, "sizing").unwrap_or(DEFAULT_SIZING);
    let sizing = match raw {
        "fix" => Sizing::Fix,
        "auto" => Sizing::Auto,
        "stretch" => Sizing::Stretch,
        other => {
            return Err(Error::UnknownAttributeValue {
                element: element.tag_name().name().to_string(),
                attribute: "sizing".to_string(),
                value: other.to_string(),
            })
        }
    };
    template.set_sizing(sizing);
    Ok(())
}

fn parse_name_attribute(element: &roxmltree::Node<'_, '_>, template: &Template) -> Result<()> {
    let Some(raw) = attr(element, "name") else {
        return Ok(());
    };
    if is_reference_expression(raw) {
        return Err(Error::NameIsReference {
            element: element.tag_name().name().to_string(),
        });
    }
    template.set_name(raw.to_string());
    Ok(())
}

fn addressing_mode_of(element: &roxmltree::Node<'_, '_>) -> Result<AddressingMode> {
    let raw = attr(element, "addressing-mode").unwrap_or(DEFAULT_ADDRESSING_MODE);
    match raw {
        "relative" => Ok(AddressingMode::Relative),
        "absolute" => Ok(AddressingMode::Absolute),
        other => Err(Error::UnknownAttributeValue {
            element: element.tag_name().name().to_string(),
            attribute: "addressing-mode".to_string(),
            value: other.to_string(),
        }),
    }
}

fn parse_offset_attribute(element: &roxmltree::Node<'_, '_>, template: &Template) -> Result<()> {
    template.set_addressing_mode(addressing_mode_of(element)?);
    let Some(raw) = attr(element, "offset") else {
        return Ok(());
    };
    let property = parse_attribute_value(raw)?;
    template.set_offset_property(property);
    Ok(())
}

fn parse_size_attribute(element: &roxmltree::Node<'_, '_>, template: &Template) -> Result<()> {
    let Some(raw) = attr(element, "size") else {
        return Ok(());
    };
    template.set_size_property(parse_attribute_value(raw)?);
    Ok(())
}

fn parse_boundary_attribute(element: &roxmltree::Node<'_, '_>, template: &Template) -> Result<()> {
    let Some(raw) = attr(element, "boundary") else {
        return Ok(());
    };
    template.set_boundary_property(parse_attribute_value(raw)?);
    Ok(())
}

fn parse_padding_attribute(element: &roxmltree::Node<'_, '_>, template: &Template, name: &str) -> Result<()> {
    let Some(raw) = attr(element, name) else {
        return Ok(());
    };
    let property = parse_attribute_value(raw)?;
    if name == "padding-before" {
        template.set_padding_before_property(property);
    } else {
        template.set_padding_after_property(property);
    }
    Ok(())
}

fn parse_signature_attribute(element: &roxmltree::Node<'_, '_>, template: &Template) -> Result<()> {
    let Some(raw) = attr(element, "signature") else {
        return Ok(());
    };
    template.set_signature(parse_hex_bytes(raw)?);
    Ok(())
}

/// Returns whether the node is marked `hint="optional"`. Schema error if
/// `hint` is present without a `signature` (spec §4.4).
fn parse_hint_attribute(element: &roxmltree::Node<'_, '_>, template: &Template) -> Result<bool> {
    let Some(raw) = attr(element, "hint") else {
        return Ok(false);
    };
    if raw != "optional" {
        return Err(Error::UnknownAttributeValue {
            element: element.tag_name().name().to_string(),
            attribute: "hint".to_string(),
            value: raw.to_string(),
        });
    }
    if template.signature().is_none() {
        return Err(Error::HintWithoutSignature {
            element: element.tag_name().name().to_string(),
        });
    }
    template.set_optional(true);
    Ok(true)
}

/// `count` only supports integer literals at build time (spec §4.3);
/// a reference-valued count would need the stream bound before the tree
/// finishes building, which the binder cannot provide.
fn parse_count_attribute(element: &roxmltree::Node<'_, '_>) -> Result<Option<u64>> {
    let Some(raw) = attr(element, "count") else {
        return Ok(None);
    };
    if is_reference_expression(raw) {
        return Err(Error::UnsupportedCount(raw.to_string()));
    }
    let value = parse_int_literal(raw).map_err(|_| Error::UnsupportedCount(raw.to_string()))?;
    Ok(Some(value.max(0) as u64))
}

/// Text content: a `text="0x..."` attribute, or whitespace-separated hex
/// pairs between the element's tags (spec §6, `test_text.py`). When
/// present and no explicit `size` attribute was given, defaults `size`
/// to the text length.
fn parse_text(element: &roxmltree::Node<'_, '_>, template: &Template) -> Result<()> {
    let text_bytes = if let Some(raw) = attr(element, "text") {
        Some(parse_hex_bytes(raw)?)
    } else {
        let joined: String = element
            .children()
            .filter(|n| n.is_text())
            .filter_map(|n| n.text())
            .collect();
        let trimmed = joined.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(parse_hex_pairs(trimmed)?)
        }
    };

    if let Some(bytes) = text_bytes {
        if attr(element, "size").is_none() {
            template.set_size_property(Property::Literal(bytes.len() as i128));
        }
        template.set_text(bytes);
    }
    Ok(())
}

fn is_reference_expression(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.starts_with('{') && trimmed.ends_with('}')
}

/// Parses an attribute value that is either an integer literal or a
/// reference expression `{name[, key=value]*}` (spec §6), mirroring
/// `xml.py::_parse_attribute_value`.
fn parse_attribute_value(raw: &str) -> Result<Property> {
    let trimmed = raw.trim();
    if !is_reference_expression(trimmed) {
        let value = parse_int_literal(trimmed)?;
        return Ok(Property::Literal(value));
    }

    let inner = &trimmed[1..trimmed.len() - 1];
    let tokens: Vec<&str> = inner.split(',').map(str::trim).filter(|t| !t.is_empty()).collect();

    let mut name: Option<String> = None;
    let mut byteorder = ByteOrder::Little;
    let mut converter_name: Option<String> = None;
    let mut provider_name: Option<String> = None;

    for (i, token) in tokens.iter().enumerate() {
        if let Some((key, value)) = token.split_once('=') {
            let key = key.trim();
            let value = value.trim();
            match key {
                "name" => name = Some(value.to_string()),
                "byteorder" => {
                    byteorder = match value {
                        "little" => ByteOrder::Little,
                        "big" => ByteOrder::Big,
                        other => return Err(Error::MalformedReference(format!("unknown byteorder {other:?}"))),
                    }
                }
                "converter" => converter_name = Some(value.to_string()),
                "provider" => provider_name = Some(value.to_string()),
                other => {
                    return Err(Error::MalformedReference(format!(
                        "unknown reference key {other:?} in {raw:?}"
                    )))
                }
            }
        } else if i == 0 && *token != "byteorder" && *token != "converter" && *token != "provider" {
            name = Some(token.to_string());
        } else {
            return Err(Error::MalformedReference(raw.to_string()));
        }
    }

    let target = match &name {
        Some(n) => Target::Named(n.clone()),
        None => Target::SelfNode,
    };

    if let Some(provider) = provider_name {
        return Ok(Property::Provider {
            target,
            kind: ProviderKind::Custom(provider),
        });
    }

    if let Some(converter) = converter_name {
        let kind = match converter.as_str() {
            "leb128u" => ProviderKind::Leb128Value,
            "leb128size" => ProviderKind::Leb128Size,
            other => return Err(Error::MalformedReference(format!("unknown converter {other:?}"))),
        };
        return Ok(Property::Provider { target, kind });
    }

    match name {
        Some(n) => Ok(Property::reference(n, Converter::Integer(byteorder))),
        None => Err(Error::MalformedReference(raw.to_string())),
    }
}

/// Accepts decimal, `0x` hex, `0o` octal and `0b` binary, matching
/// Python's `int(x, base=0)` the teacher's attribute grammar relies on.
fn parse_int_literal(raw: &str) -> Result<i128> {
    let trimmed = raw.trim();
    let (negative, trimmed) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let value = if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        i128::from_str_radix(hex, 16)
    } else if let Some(oct) = trimmed.strip_prefix("0o").or_else(|| trimmed.strip_prefix("0O")) {
        i128::from_str_radix(oct, 8)
    } else if let Some(bin) = trimmed.strip_prefix("0b").or_else(|| trimmed.strip_prefix("0B")) {
        i128::from_str_radix(bin, 2)
    } else {
        trimmed.parse::<i128>()
    }
    .map_err(|_| Error::MalformedReference(raw.to_string()))?;
    Ok(if negative { -value } else { value })
}

/// Parses a `0x`-prefixed even-length hex string into bytes.
fn parse_hex_bytes(raw: &str) -> Result<Vec<u8>> {
    let trimmed = raw.trim();
    let hex = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")).unwrap_or(trimmed);
    parse_hex_pairs(hex)
}

/// Parses a sequence of hex pairs, optionally whitespace-separated
/// (`"00 11 22 33"`) or contiguous (`"00112233"`).
fn parse_hex_pairs(raw: &str) -> Result<Vec<u8>> {
    let compact: String = raw.split_whitespace().collect();
    if compact.len() % 2 != 0 {
        return Err(Error::MalformedSignature(raw.to_string()));
    }
    let mut out = Vec::with_capacity(compact.len() / 2);
    let bytes = compact.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let pair = std::str::from_utf8(&bytes[i..i + 2]).unwrap();
        let byte = u8::from_str_radix(pair, 16).map_err(|_| Error::MalformedSignature(raw.to_string()))?;
        out.push(byte);
        i += 2;
    }
    Ok(out)
}
