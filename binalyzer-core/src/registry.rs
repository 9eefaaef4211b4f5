//! Named extension providers (spec §4.1 "Custom provider", §4.6 "Extensions").

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::node::Template;

pub type ProviderFn = dyn Fn(&Template) -> Result<u64>;

/// Maps a name (as used in a `provider=name` reference key) to a closure
/// producing an integer from the node the provider is dispatched against.
#[derive(Default, Clone)]
pub struct Registry {
    providers: HashMap<String, Rc<ProviderFn>>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    pub fn register(&mut self, name: impl Into<String>, provider: impl Fn(&Template) -> Result<u64> + 'static) {
        self.providers.insert(name.into(), Rc::new(provider));
    }

    pub fn get(&self, name: &str) -> Result<Rc<ProviderFn>> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownProvider(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}
