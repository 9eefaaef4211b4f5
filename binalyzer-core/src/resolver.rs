//! Lazy, mutually-recursive resolution of offset/size/value (spec §4.3).
//!
//! Nothing here is cached: every call recomputes from the current state of
//! the tree and the stream, as spec §3 requires. A thread-local recursion
//! guard bounds the call depth (spec §5); a thread-local in-progress set
//! turns an actual reference cycle into a distinct error instead of just
//! tripping the generic depth cap.

use std::cell::RefCell as StdRefCell;
use std::collections::HashSet;

use crate::converter::decode_leb128;
use crate::error::{Error, Result};
use crate::node::Template;
use crate::property::{AddressingMode, Property, ProviderKind, Target};

const RECURSION_LIMIT: usize = 512;

thread_local! {
    static DEPTH: StdRefCell<usize> = StdRefCell::new(0);
    static IN_PROGRESS: StdRefCell<HashSet<usize>> = StdRefCell::new(HashSet::new());
}

struct DepthGuard;

impl DepthGuard {
    fn enter() -> Result<DepthGuard> {
        DEPTH.with(|d| {
            let mut d = d.borrow_mut();
            if *d >= RECURSION_LIMIT {
                return Err(Error::RecursionLimit(RECURSION_LIMIT));
            }
            *d += 1;
            Ok(())
        })?;
        Ok(DepthGuard)
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|d| *d.borrow_mut() -= 1);
    }
}

/// Marks `identity` (a node's `Inner` pointer cast to `usize`) as being
/// resolved via a reference right now; dropping the guard un-marks it.
struct CycleGuard {
    identity: usize,
}

impl CycleGuard {
    fn enter(identity: usize, description: &str) -> Result<CycleGuard> {
        let already = IN_PROGRESS.with(|set| !set.borrow_mut().insert(identity));
        if already {
            log::debug!("reference cycle detected while resolving {description:?}");
            return Err(Error::ReferenceCycle(description.to_string()));
        }
        Ok(CycleGuard { identity })
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        IN_PROGRESS.with(|set| {
            set.borrow_mut().remove(&self.identity);
        });
    }
}

fn round_up(value: u64, boundary: u64) -> u64 {
    if boundary == 0 {
        return value;
    }
    let value = value as u128;
    let boundary = boundary as u128;
    (((value + boundary - 1) / boundary) * boundary) as u64
}

impl Template {
    /// The node's position relative to its parent (or, for absolute
    /// addressing, the literal absolute address itself) — the same value
    /// the original XML attribute binder names `offset`.
    pub fn offset(&self) -> Result<u64> {
        let _guard = DepthGuard::enter()?;
        self.resolve_address().map(|(_, offset)| offset)
    }

    pub fn absolute_address(&self) -> Result<u64> {
        let _guard = DepthGuard::enter()?;
        self.resolve_address().map(|(address, _)| address)
    }

    fn parent_absolute_address(&self) -> Result<u64> {
        match self.parent() {
            Some(parent) => parent.absolute_address(),
            None => Ok(0),
        }
    }

    /// Returns `(absolute_address, offset)` computed together so a single
    /// call only asks the parent for its address once.
    fn resolve_address(&self) -> Result<(u64, u64)> {
        match self.addressing_mode() {
            AddressingMode::Absolute => {
                let raw = self.eval_offset_property()?;
                Ok((raw, raw))
            }
            AddressingMode::Relative => {
                let parent_address = self.parent_absolute_address()?;
                let raw = self.eval_offset_property()?;
                let naive = parent_address + raw;
                let boundary = self.boundary()?;
                let address = round_up(naive, boundary);
                Ok((address, address - parent_address))
            }
        }
    }

    fn eval_offset_property(&self) -> Result<u64> {
        match self.offset_property() {
            Property::RelativeOffset => {
                let padding_before = self.padding_before()?;
                let Some(parent) = self.parent() else {
                    return Ok(padding_before);
                };
                let siblings = parent.children();
                let index = siblings.iter().position(|s| s == self);
                match index.and_then(|i| i.checked_sub(1)) {
                    Some(prev_index) => {
                        let prev = &siblings[prev_index];
                        let prev_end = prev.offset()? + prev.size()? + prev.padding_after()?;
                        Ok(prev_end + padding_before)
                    }
                    None => Ok(padding_before),
                }
            }
            other => self.eval_scalar_property(&other),
        }
    }

    pub fn size(&self) -> Result<u64> {
        let _guard = DepthGuard::enter()?;
        let property = self.size_property();
        let derived = matches!(property, Property::AutoSize | Property::StretchSize);
        let raw = match property {
            Property::AutoSize => self.compute_auto_size()?,
            Property::StretchSize => self.compute_stretch_size()?,
            other => self.eval_scalar_property(&other)?,
        };
        if derived {
            let boundary = self.boundary()?;
            Ok(round_up(raw, boundary))
        } else {
            Ok(raw)
        }
    }

    fn compute_auto_size(&self) -> Result<u64> {
        let children = self.children();
        if children.is_empty() {
            if let Some(text) = self.text() {
                return Ok(text.len() as u64);
            }
            return Ok(0);
        }
        let mut extent = 0u64;
        for child in children {
            if matches!(child.size_property(), Property::StretchSize) {
                continue;
            }
            let end = child.offset()? + child.size()? + child.padding_after()?;
            extent = extent.max(end);
        }
        Ok(extent)
    }

    fn compute_stretch_size(&self) -> Result<u64> {
        let offset = self.offset()?;
        let available = match self.parent() {
            Some(parent) => parent.size()?,
            None => self.binding_context().borrow().stream().borrow().len(),
        };
        Ok(available.saturating_sub(offset))
    }

    pub fn boundary(&self) -> Result<u64> {
        self.eval_scalar_property(&self.boundary_property())
    }

    pub fn padding_before(&self) -> Result<u64> {
        self.eval_scalar_property(&self.padding_before_property())
    }

    pub fn padding_after(&self) -> Result<u64> {
        self.eval_scalar_property(&self.padding_after_property())
    }

    /// Evaluates a `Literal` or `Provider` property to an unsigned integer.
    /// The derived offset/size variants are never passed here directly by
    /// public callers; they are handled by `eval_offset_property`/`size`.
    fn eval_scalar_property(&self, property: &Property) -> Result<u64> {
        match property {
            Property::Literal(value) => Ok((*value).max(0) as u64),
            Property::Provider { target, kind } => self.eval_provider(target, kind),
            Property::RelativeOffset | Property::AutoSize | Property::StretchSize => Ok(0),
        }
    }

    fn target_node(&self, target: &Target) -> Result<Template> {
        match target {
            Target::SelfNode => Ok(self.clone()),
            Target::Named(name) => self.resolve_reference(name),
        }
    }

    fn eval_provider(&self, target: &Target, kind: &ProviderKind) -> Result<u64> {
        let node = self.target_node(target)?;
        let identity = node.0.as_ptr() as usize;
        let description = match target {
            Target::SelfNode => self.name().unwrap_or_else(|| "<anonymous>".to_string()),
            Target::Named(name) => name.clone(),
        };
        log::trace!("resolving {kind:?} against {description:?}");
        let _cycle_guard = CycleGuard::enter(identity, &description)?;
        match kind {
            ProviderKind::StreamRead(converter) => {
                let bytes = node.value()?;
                Ok(converter.decode(&bytes))
            }
            ProviderKind::Leb128Size => {
                let address = node.absolute_address()?;
                let stream = node.binding_context().borrow().stream();
                let mut address = address;
                let mut count = 0u64;
                loop {
                    let byte = stream.borrow_mut().read_at(address, 1)?;
                    count += 1;
                    if byte[0] & 0x80 == 0 {
                        break;
                    }
                    address += 1;
                }
                Ok(count)
            }
            ProviderKind::Leb128Value => {
                let address = node.absolute_address()?;
                let stream = node.binding_context().borrow().stream();
                let mut bytes = Vec::new();
                let mut address = address;
                loop {
                    let byte = stream.borrow_mut().read_at(address, 1)?;
                    let more = byte[0] & 0x80 != 0;
                    bytes.push(byte[0]);
                    if !more {
                        break;
                    }
                    address += 1;
                }
                Ok(decode_leb128(&bytes).0)
            }
            ProviderKind::Custom(name) => {
                let registry = node.binding_context().borrow().registry();
                let provider = registry.borrow().get(name)?;
                provider(&node)
            }
        }
    }

    /// Reads `size()` bytes at `absolute_address()` from the bound stream.
    pub fn value(&self) -> Result<Vec<u8>> {
        let _guard = DepthGuard::enter()?;
        let address = self.absolute_address()?;
        let size = self.size()?;
        let stream = self.binding_context().borrow().stream();
        stream.borrow_mut().read_at(address, size)
    }

    /// Reads the node's declared `signature` length of bytes at its
    /// resolved position and compares them against the declared bytes.
    /// Returns `true` when no signature is declared (spec §4.4/§4.5).
    pub fn check_signature(&self) -> Result<bool> {
        let Some(expected) = self.signature() else {
            return Ok(true);
        };
        let address = self.absolute_address()?;
        let stream = self.binding_context().borrow().stream();
        let found = stream.borrow_mut().read_at(address, expected.len() as u64)?;
        Ok(found == expected)
    }

    /// Writes `bytes` at `absolute_address()`. Shorter buffers are zero
    /// padded to `size()`; longer buffers are truncated, per spec §4.3.
    pub fn set_value(&self, bytes: &[u8]) -> Result<()> {
        let _guard = DepthGuard::enter()?;
        let address = self.absolute_address()?;
        let size = self.size()? as usize;
        let mut buffer = vec![0u8; size];
        let n = bytes.len().min(size);
        buffer[..n].copy_from_slice(&bytes[..n]);
        let stream = self.binding_context().borrow().stream();
        stream.borrow_mut().write_at(address, &buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::{ByteOrder, Converter};
    use crate::property::Sizing;
    use crate::stream::ByteStream;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn bind(root: &Template, bytes: Vec<u8>) {
        let stream: Rc<RefCell<dyn crate::stream::DataStream>> =
            Rc::new(RefCell::new(ByteStream::backed(bytes)));
        root.binding_context().borrow_mut().stream = stream;
    }

    #[test]
    fn sibling_chain_offsets() {
        let root = Template::new();
        root.set_sizing(Sizing::Auto);
        let a = Template::new();
        a.set_sizing(Sizing::Fix);
        a.set_size_property(Property::Literal(4));
        let b = Template::new();
        b.set_sizing(Sizing::Fix);
        b.set_size_property(Property::Literal(4));
        root.add_child(&a);
        root.add_child(&b);
        bind(&root, vec![0; 16]);

        assert_eq!(a.offset().unwrap(), 0);
        assert_eq!(b.offset().unwrap(), 4);
        assert_eq!(root.size().unwrap(), 8);
    }

    #[test]
    fn boundary_rounds_literal_offset_but_not_literal_size() {
        let root = Template::new();
        root.set_offset_property(Property::Literal(0x20));
        root.set_boundary_property(Property::Literal(0x100));
        root.set_sizing(Sizing::Fix);
        root.set_size_property(Property::Literal(0x500));
        bind(&root, vec![0; 0x800]);

        assert_eq!(root.offset().unwrap(), 256);
        assert_eq!(root.size().unwrap(), 0x500);
    }

    #[test]
    fn stretch_excludes_from_auto_size() {
        let root = Template::new();
        root.set_sizing(Sizing::Auto);
        root.set_boundary_property(Property::Literal(0x100));

        let header = Template::new();
        header.set_sizing(Sizing::Fix);
        header.set_size_property(Property::Literal(4));

        let payload = Template::new();
        payload.set_sizing(Sizing::Stretch);

        root.add_child(&header);
        root.add_child(&payload);
        bind(&root, vec![0; 256]);

        assert_eq!(root.size().unwrap(), 256);
        assert_eq!(payload.offset().unwrap(), 4);
        assert_eq!(payload.size().unwrap(), 252);
    }

    #[test]
    fn reference_reads_referent_value() {
        let root = Template::new();
        root.set_sizing(Sizing::Auto);

        let length = Template::new();
        length.set_name("length");
        length.set_sizing(Sizing::Fix);
        length.set_size_property(Property::Literal(1));

        let payload = Template::new();
        payload.set_sizing(Sizing::Fix);
        payload.set_size_property(Property::reference(
            "length",
            Converter::Integer(ByteOrder::Little),
        ));

        root.add_child(&length);
        root.add_child(&payload);
        bind(&root, vec![3, 0xAA, 0xBB, 0xCC]);

        assert_eq!(payload.size().unwrap(), 3);
        assert_eq!(payload.value().unwrap(), vec![0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn self_reference_cycle_is_detected() {
        let root = Template::new();
        root.set_name("root");
        root.set_sizing(Sizing::Fix);
        root.set_size_property(Property::reference(
            "root",
            Converter::Integer(ByteOrder::Little),
        ));
        bind(&root, vec![0; 8]);

        let err = root.size().unwrap_err();
        assert!(matches!(err, Error::ReferenceCycle(_)));
    }
}
