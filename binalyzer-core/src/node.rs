//! The template tree (spec §3): a mutable, shared, parent-aware node.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::binding::BindingContext;
use crate::error::{Error, Result};
use crate::property::{AddressingMode, Property, Sizing};

pub(crate) struct Inner {
    pub(crate) self_ref: Weak<RefCell<Inner>>,
    pub(crate) parent: Option<Weak<RefCell<Inner>>>,
    pub(crate) children: Vec<Template>,

    pub(crate) name: Option<String>,
    pub(crate) addressing_mode: AddressingMode,
    pub(crate) sizing: Sizing,

    pub(crate) offset_property: Property,
    pub(crate) size_property: Property,
    pub(crate) boundary_property: Property,
    pub(crate) padding_before_property: Property,
    pub(crate) padding_after_property: Property,

    pub(crate) text: Option<Vec<u8>>,
    pub(crate) signature: Option<Vec<u8>>,
    pub(crate) optional: bool,

    pub(crate) binding_context: Rc<RefCell<BindingContext>>,
}

/// A handle to a node of a binary layout tree. Cheap to clone (pointer
/// clone); two handles compare equal when they point at the same node.
#[derive(Clone)]
pub struct Template(pub(crate) Rc<RefCell<Inner>>);

impl PartialEq for Template {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for Template {}

impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.0.borrow();
        f.debug_struct("Template")
            .field("name", &inner.name)
            .field("children", &inner.children.len())
            .finish()
    }
}

impl Template {
    /// A detached root node with default properties and a fresh,
    /// unshared binding context.
    pub fn new() -> Self {
        let binding_context = BindingContext::detached();
        let inner = Rc::new_cyclic(|weak| {
            RefCell::new(Inner {
                self_ref: weak.clone(),
                parent: None,
                children: Vec::new(),
                name: None,
                addressing_mode: AddressingMode::default(),
                sizing: Sizing::default(),
                offset_property: Property::RelativeOffset,
                size_property: Property::AutoSize,
                boundary_property: Property::Literal(0),
                padding_before_property: Property::Literal(0),
                padding_after_property: Property::Literal(0),
                text: None,
                signature: None,
                optional: false,
                binding_context,
            })
        });
        {
            let root_weak = Rc::downgrade(&inner);
            inner.borrow().binding_context.borrow_mut().root = root_weak;
        }
        Template(inner)
    }

    pub(crate) fn from_inner(inner: Rc<RefCell<Inner>>) -> Self {
        Template(inner)
    }

    pub(crate) fn weak(&self) -> Weak<RefCell<Inner>> {
        Rc::downgrade(&self.0)
    }

    // --- plain accessors -------------------------------------------------

    pub fn name(&self) -> Option<String> {
        self.0.borrow().name.clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        let name = name.into();
        let ctx = self.0.borrow().binding_context.clone();
        ctx.borrow_mut().register_symbol(name.clone(), self.weak());
        self.0.borrow_mut().name = Some(name);
    }

    pub fn addressing_mode(&self) -> AddressingMode {
        self.0.borrow().addressing_mode
    }

    pub fn set_addressing_mode(&self, mode: AddressingMode) {
        self.0.borrow_mut().addressing_mode = mode;
    }

    pub fn sizing(&self) -> Sizing {
        self.0.borrow().sizing
    }

    pub fn set_sizing(&self, sizing: Sizing) {
        self.0.borrow_mut().sizing = sizing;
        let default = match sizing {
            Sizing::Auto => Property::AutoSize,
            Sizing::Stretch => Property::StretchSize,
            Sizing::Fix => Property::Literal(0),
        };
        self.0.borrow_mut().size_property = default;
    }

    pub fn offset_property(&self) -> Property {
        self.0.borrow().offset_property.clone()
    }
    pub fn set_offset_property(&self, property: Property) {
        self.0.borrow_mut().offset_property = property;
    }

    pub fn size_property(&self) -> Property {
        self.0.borrow().size_property.clone()
    }
    pub fn set_size_property(&self, property: Property) {
        self.0.borrow_mut().size_property = property;
    }

    pub fn boundary_property(&self) -> Property {
        self.0.borrow().boundary_property.clone()
    }
    pub fn set_boundary_property(&self, property: Property) {
        self.0.borrow_mut().boundary_property = property;
    }

    pub fn padding_before_property(&self) -> Property {
        self.0.borrow().padding_before_property.clone()
    }
    pub fn set_padding_before_property(&self, property: Property) {
        self.0.borrow_mut().padding_before_property = property;
    }

    pub fn padding_after_property(&self) -> Property {
        self.0.borrow().padding_after_property.clone()
    }
    pub fn set_padding_after_property(&self, property: Property) {
        self.0.borrow_mut().padding_after_property = property;
    }

    pub fn text(&self) -> Option<Vec<u8>> {
        self.0.borrow().text.clone()
    }
    pub fn set_text(&self, bytes: Vec<u8>) {
        self.0.borrow_mut().text = Some(bytes);
    }

    pub fn signature(&self) -> Option<Vec<u8>> {
        self.0.borrow().signature.clone()
    }
    pub fn set_signature(&self, bytes: Vec<u8>) {
        self.0.borrow_mut().signature = Some(bytes);
    }

    pub fn optional(&self) -> bool {
        self.0.borrow().optional
    }
    pub fn set_optional(&self, optional: bool) {
        self.0.borrow_mut().optional = optional;
    }

    // --- tree navigation ---------------------------------------------------

    pub fn parent(&self) -> Option<Template> {
        self.0
            .borrow()
            .parent
            .as_ref()
            .and_then(|weak| weak.upgrade())
            .map(Template::from_inner)
    }

    pub fn children(&self) -> Vec<Template> {
        self.0.borrow().children.clone()
    }

    pub fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    pub fn root(&self) -> Template {
        let ctx = self.0.borrow().binding_context.clone();
        let root = ctx.borrow().root.clone();
        root.upgrade()
            .map(Template::from_inner)
            .unwrap_or_else(|| self.clone())
    }

    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<Template> {
        self.0
            .borrow()
            .children
            .iter()
            .find(|c| c.name().as_deref() == Some(name))
            .cloned()
    }

    /// Walks a dotted path (`"layout0.area0.field1"`) from this node.
    pub fn path(&self, dotted: &str) -> Option<Template> {
        let mut current = self.clone();
        for segment in dotted.split('.') {
            current = current.child(segment)?;
        }
        Some(current)
    }

    /// Depth-first search for the first descendant (including self's
    /// whole tree from the root) with the given bare name — the lookup
    /// strategy a plain (non-dotted) reference uses.
    pub fn find_by_name(&self, name: &str) -> Option<Template> {
        if let Some(weak) = self.0.borrow().binding_context.borrow().lookup_symbol(name) {
            if let Some(inner) = weak.upgrade() {
                return Some(Template::from_inner(inner));
            }
        }
        None
    }

    /// Resolves a reference expression's name: a dotted path is walked
    /// from the root; a bare name is looked up in the shared symbol table.
    pub fn resolve_reference(&self, name: &str) -> Result<Template> {
        if name.contains('.') {
            self.root()
                .path(name)
                .ok_or_else(|| Error::UnknownReference(name.to_string()))
        } else {
            self.find_by_name(name)
                .ok_or_else(|| Error::UnknownReference(name.to_string()))
        }
    }

    pub fn binding_context(&self) -> Rc<RefCell<BindingContext>> {
        self.0.borrow().binding_context.clone()
    }

    /// Appends `child` to this node's children, sets its parent
    /// back-reference and shares this node's binding context with it
    /// (and, transitively, with everything already under `child`) —
    /// registering every already-named descendant's symbol into the
    /// newly shared context along the way.
    pub fn add_child(&self, child: &Template) {
        self.attach(child);
        self.append_child(child);
    }

    /// Sets `child`'s parent back-reference and shares this node's
    /// binding context with it, without yet listing it among `children`.
    /// Lets a binder resolve a tentative address (e.g. to run a
    /// `signature` check, spec §4.4/§4.5) before deciding whether the
    /// node is kept at all.
    pub fn attach(&self, child: &Template) {
        child.0.borrow_mut().parent = Some(self.weak());
        Self::adopt_binding_context(child, self.binding_context());
    }

    /// Lists an already-`attach`ed child among this node's children.
    pub fn append_child(&self, child: &Template) {
        self.0.borrow_mut().children.push(child.clone());
    }

    /// Retracts a previously `append_child`ed node (e.g. one provisionally
    /// listed so its tentative offset could be resolved for a `signature`
    /// check, then dropped on mismatch). Leaves `child`'s parent
    /// back-reference and binding context untouched.
    pub fn remove_child(&self, child: &Template) {
        self.0.borrow_mut().children.retain(|c| c != child);
    }

    fn adopt_binding_context(node: &Template, ctx: Rc<RefCell<BindingContext>>) {
        node.0.borrow_mut().binding_context = ctx.clone();
        if let Some(name) = node.name() {
            ctx.borrow_mut().register_symbol(name, node.weak());
        }
        for child in node.children() {
            Self::adopt_binding_context(&child, ctx.clone());
        }
    }

    /// Creates a structural clone of this node (and its subtree) detached
    /// from any parent, used to materialize `count` repetitions.
    pub fn clone_detached(&self) -> Template {
        let inner = self.0.borrow();
        let clone = Template::new();
        {
            let mut c = clone.0.borrow_mut();
            c.name = inner.name.clone();
            c.addressing_mode = inner.addressing_mode;
            c.sizing = inner.sizing;
            c.offset_property = inner.offset_property.clone();
            c.size_property = inner.size_property.clone();
            c.boundary_property = inner.boundary_property.clone();
            c.padding_before_property = inner.padding_before_property.clone();
            c.padding_after_property = inner.padding_after_property.clone();
            c.text = inner.text.clone();
            c.signature = inner.signature.clone();
            c.optional = inner.optional;
        }
        for child in &inner.children {
            let child_clone = child.clone_detached();
            clone.add_child(&child_clone);
        }
        clone
    }
}

impl Default for Template {
    fn default() -> Self {
        Template::new()
    }
}
