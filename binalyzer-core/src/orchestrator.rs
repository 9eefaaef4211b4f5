//! The top-level handle bindings an application uses (spec §4.6).

use std::cell::RefCell;
use std::rc::Rc;

use crate::node::Template;
use crate::stream::DataStream;

/// Owns a root [`Template`] and the stream it is bound against.
/// Reassigning either re-propagates through the whole subtree by mutating
/// the shared [`crate::BindingContext`] in place.
pub struct Binalyzer {
    template: Template,
}

impl Binalyzer {
    pub fn new(template: Template, stream: Rc<RefCell<dyn DataStream>>) -> Self {
        {
            let ctx = template.binding_context();
            let mut ctx = ctx.borrow_mut();
            ctx.stream = stream;
            ctx.root = template.weak();
        }
        Binalyzer { template }
    }

    pub fn template(&self) -> Template {
        self.template.clone()
    }

    /// Replaces the bound template, carrying the previous stream and
    /// extension registry over into the new tree's binding context.
    pub fn set_template(&mut self, template: Template) {
        let stream = self.template.binding_context().borrow().stream();
        let registry = self.template.binding_context().borrow().registry();
        {
            let ctx = template.binding_context();
            let mut ctx = ctx.borrow_mut();
            ctx.stream = stream;
            ctx.registry = registry;
            ctx.root = template.weak();
        }
        self.template = template;
    }

    pub fn stream(&self) -> Rc<RefCell<dyn DataStream>> {
        self.template.binding_context().borrow().stream()
    }

    /// Replaces the bound stream without disturbing the template tree.
    pub fn set_stream(&mut self, stream: Rc<RefCell<dyn DataStream>>) {
        self.template.binding_context().borrow_mut().stream = stream;
    }

    /// Registers an extension-provided closure under `name`, reachable
    /// from a `provider="name"` reference key (spec §4.1, §4.6).
    pub fn register_provider(
        &mut self,
        name: impl Into<String>,
        provider: impl Fn(&Template) -> crate::error::Result<u64> + 'static,
    ) {
        self.template
            .binding_context()
            .borrow()
            .registry()
            .borrow_mut()
            .register(name, provider);
    }
}
