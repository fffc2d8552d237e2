//! Fish catalog — the static compatibility dataset, loaded once at startup.
//!
//! The dataset maps a category (`freshwater` / `marine`) to an ordered list of
//! fish records. Relation lists are asymmetric and may disagree with each
//! other; the scorer checks both directions. A record missing a relation list
//! is treated as if the list were empty.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Dataset compiled into the binary; used when no override path is configured.
pub const BUNDLED_DATASET: &str = include_str!("../../data/fishcompat.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read fish dataset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed fish dataset: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown {category} fish '{name}'")]
    UnknownFish { category: Category, name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Freshwater,
    Marine,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Freshwater, Category::Marine];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Freshwater => "freshwater",
            Category::Marine => "marine",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "freshwater" => Ok(Category::Freshwater),
            "marine" | "saltwater" => Ok(Category::Marine),
            other => Err(format!("unknown category '{other}'")),
        }
    }
}

/// One fish in the dataset. `category` is filled in from the list the record
/// was found under, not from the record itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FishRecord {
    pub name: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub latin_name: Option<String>,
    #[serde(default)]
    pub common_names: Vec<String>,
    #[serde(default, rename = "imageURL")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub compatible: BTreeSet<String>,
    #[serde(default)]
    pub not_compatible: BTreeSet<String>,
    #[serde(default)]
    pub not_recommended: BTreeSet<String>,
    #[serde(default)]
    pub with_caution: BTreeSet<String>,
}

/// The four relation lists a record can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Compatible,
    NotCompatible,
    NotRecommended,
    WithCaution,
}

impl FishRecord {
    /// Whether this record lists `other` under `relation`.
    pub fn lists(&self, relation: Relation, other: &str) -> bool {
        let set = match relation {
            Relation::Compatible => &self.compatible,
            Relation::NotCompatible => &self.not_compatible,
            Relation::NotRecommended => &self.not_recommended,
            Relation::WithCaution => &self.with_caution,
        };
        set.contains(other)
    }
}

#[cfg(test)]
impl FishRecord {
    /// A bare record with no relations; handy for building selections by hand.
    pub fn named(name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            category,
            latin_name: None,
            common_names: Vec::new(),
            image_url: None,
            compatible: BTreeSet::new(),
            not_compatible: BTreeSet::new(),
            not_recommended: BTreeSet::new(),
            with_caution: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    freshwater: Vec<FishRecord>,
    #[serde(default)]
    marine: Vec<FishRecord>,
}

/// Immutable, category-keyed fish dataset.
#[derive(Debug, Clone, Default)]
pub struct FishCatalog {
    by_category: HashMap<Category, Vec<FishRecord>>,
}

impl FishCatalog {
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_json::from_str(json)?;

        let mut by_category = HashMap::new();
        for (category, mut records) in [
            (Category::Freshwater, raw.freshwater),
            (Category::Marine, raw.marine),
        ] {
            for record in &mut records {
                record.category = category;
            }
            by_category.insert(category, records);
        }

        Ok(Self { by_category })
    }

    /// Loads the dataset from `path`, or the bundled dataset when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        let catalog = match path {
            Some(path) => {
                let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_json_str(&json)?
            }
            None => Self::from_json_str(BUNDLED_DATASET)?,
        };

        info!(
            "Fish catalog loaded: {} freshwater, {} marine",
            catalog.fish(Category::Freshwater).len(),
            catalog.fish(Category::Marine).len()
        );
        Ok(catalog)
    }

    /// All fish in a category, in dataset order.
    pub fn fish(&self, category: Category) -> &[FishRecord] {
        self.by_category
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn find(&self, category: Category, name: &str) -> Option<&FishRecord> {
        self.fish(category).iter().find(|f| f.name == name)
    }

    /// Resolves names to records, preserving the order of `names`.
    pub fn resolve<S: AsRef<str>>(
        &self,
        category: Category,
        names: &[S],
    ) -> Result<Vec<FishRecord>, CatalogError> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.find(category, name)
                    .cloned()
                    .ok_or_else(|| CatalogError::UnknownFish {
                        category,
                        name: name.to_string(),
                    })
            })
            .collect()
    }
}
