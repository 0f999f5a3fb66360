use crate::extension::Extension;
use std::collections::HashMap;
use std::sync::Arc;

/// Extension instances keyed by `ExtensionInfo::name`.
#[derive(Clone, Default)]
pub struct Registry {
    extensions: HashMap<String, Arc<dyn Extension>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registering a name twice replaces the earlier instance.
    pub fn register(&mut self, extension: Arc<dyn Extension>) -> Option<Arc<dyn Extension>> {
        let name = extension.name();
        let previous = self.extensions.insert(name.clone(), extension);
        if previous.is_some() {
            log::debug!("Replaced extension '{}'", name);
        }
        previous
    }

    /// Snapshot; later registrations do not show up in it.
    pub fn get_all(&self) -> HashMap<String, Arc<dyn Extension>> {
        self.extensions.clone()
    }

    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn Extension>> {
        self.extensions.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.extensions.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.extensions.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}
