use serde::Serialize;

use crate::catalog::{CatalogError, Category, FishCatalog, FishRecord};

/// The fish a user has picked, in the order they were picked.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Selection {
    fish: Vec<FishRecord>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a selection by toggling each name in turn, so a name listed
    /// twice cancels itself out.
    pub fn from_names<S: AsRef<str>>(
        catalog: &FishCatalog,
        category: Category,
        names: &[S],
    ) -> Result<Self, CatalogError> {
        let mut selection = Self::new();
        for fish in catalog.resolve(category, names)? {
            selection.toggle(fish);
        }
        Ok(selection)
    }

    /// Adds `fish` if absent, removes it if present. Returns whether it is now selected.
    pub fn toggle(&mut self, fish: FishRecord) -> bool {
        match self.fish.iter().position(|f| f.name == fish.name) {
            Some(idx) => {
                self.fish.remove(idx);
                false
            }
            None => {
                self.fish.push(fish);
                true
            }
        }
    }

    pub fn clear(&mut self) {
        self.fish.clear();
    }

    pub fn names(&self) -> Vec<&str> {
        self.fish.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn as_slice(&self) -> &[FishRecord] {
        &self.fish
    }

    pub fn len(&self) -> usize {
        self.fish.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fish.is_empty()
    }
}
