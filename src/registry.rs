//! Element registry — the ordered, name-unique set of elements on the node.
//!
//! Elements are registered once at startup.  Registration order is the
//! order in which the page is rendered and the snapshot is serialised, and
//! it is the order in which the dispatcher applies commands.  Names are the
//! wire-protocol keys, so a duplicate is rejected rather than silently
//! shadowing the earlier element.

use std::collections::HashMap;

use crate::element::Element;
use crate::error::RegistryError;

#[derive(Default)]
pub struct Registry {
    elements: Vec<Box<dyn Element>>,
    index: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `element`.  Fails if its name is already taken.
    pub fn register(&mut self, element: Box<dyn Element>) -> Result<(), RegistryError> {
        let name = element.name().to_owned();
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        log::info!(
            "Registry: '{}' registered ({:?}) at slot {}",
            name,
            element.capability(),
            self.elements.len()
        );
        self.index.insert(name, self.elements.len());
        self.elements.push(element);
        Ok(())
    }

    /// Elements in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &(dyn Element + 'static)> {
        self.elements.iter().map(|e| e.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut (dyn Element + 'static)> {
        self.elements.iter_mut().map(|e| e.as_mut())
    }

    pub fn find(&self, name: &str) -> Option<&(dyn Element + 'static)> {
        let slot = *self.index.get(name)?;
        self.elements.get(slot).map(|e| e.as_ref())
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut (dyn Element + 'static)> {
        let slot = *self.index.get(name)?;
        self.elements.get_mut(slot).map(|e| e.as_mut())
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Concatenated markup of every element, in registration order.
    pub fn render_page(&self) -> String {
        self.iter().map(|e| e.render()).collect()
    }
}
