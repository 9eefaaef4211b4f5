//! Binding context shared by every node of a template subtree (spec §3).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::node::Inner;
use crate::registry::Registry;
use crate::stream::{ByteStream, DataStream};

/// `(root, stream)` plus the name -> node symbol table used to resolve
/// references (spec §9's recommended "build a root-scoped symbol table").
///
/// Every node of a tree holds the *same* `Rc<RefCell<BindingContext>>`, so
/// invariant 2 ("binding_context is identical for a node and all its
/// descendants") holds by construction and reassignment (a new stream, a
/// new root template) only ever needs to mutate this one shared value.
pub struct BindingContext {
    pub(crate) root: Weak<RefCell<Inner>>,
    pub(crate) stream: Rc<RefCell<dyn DataStream>>,
    pub(crate) symbols: HashMap<String, Weak<RefCell<Inner>>>,
    pub(crate) registry: Rc<RefCell<Registry>>,
}

impl BindingContext {
    pub fn detached() -> Rc<RefCell<BindingContext>> {
        Rc::new(RefCell::new(BindingContext {
            root: Weak::new(),
            stream: Rc::new(RefCell::new(ByteStream::backed(Vec::new()))),
            symbols: HashMap::new(),
            registry: Rc::new(RefCell::new(Registry::new())),
        }))
    }

    pub fn stream(&self) -> Rc<RefCell<dyn DataStream>> {
        self.stream.clone()
    }

    pub fn registry(&self) -> Rc<RefCell<Registry>> {
        self.registry.clone()
    }

    pub fn register_symbol(&mut self, name: String, node: Weak<RefCell<Inner>>) {
        self.symbols.entry(name).or_insert(node);
    }

    pub fn lookup_symbol(&self, name: &str) -> Option<Weak<RefCell<Inner>>> {
        self.symbols.get(name).cloned()
    }
}

impl std::fmt::Debug for BindingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingContext")
            .field("symbols", &self.symbols.keys().collect::<Vec<_>>())
            .finish()
    }
}
