pub mod client;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use client::{CatalogApi, CatalogError, ClientOptions, ErrorKind, HttpCatalogClient};

pub type ProductId = u64;
pub type CategoryId = u64;

pub const DEFAULT_BASE_URL: &str = "https://api.escuelajs.co/api/v1";
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/300x200?text=No+Image";
pub const DEFAULT_DESCRIPTION: &str = "No description provided";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Category {
    pub fn display_name(category: Option<&Category>) -> &str {
        match category {
            Some(c) if !c.name.trim().is_empty() => c.name.as_str(),
            _ => "N/A",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl Product {
    pub fn category_name(&self) -> &str {
        Category::display_name(self.category.as_ref())
    }

    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    /// Folds an accepted update into the local copy. The category is resolved
    /// against `known` because the server only receives the id.
    pub fn apply_patch(&mut self, patch: &ProductDraft, known: &[Category]) {
        self.title = patch.title.clone();
        self.price = patch.price;
        self.description = Some(patch.description.clone());
        self.images = patch.images.clone();

        let unchanged = self
            .category
            .as_ref()
            .is_some_and(|c| c.id == patch.category_id);
        if !unchanged {
            self.category = Some(
                known
                    .iter()
                    .find(|c| c.id == patch.category_id)
                    .cloned()
                    .unwrap_or(Category {
                        id: patch.category_id,
                        name: String::new(),
                        image: None,
                    }),
            );
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub title: String,
    pub price: f64,
    pub description: String,
    pub category_id: CategoryId,
    pub images: Vec<String>,
}

pub fn known_categories(products: &[Product]) -> Vec<Category> {
    let mut by_id: BTreeMap<CategoryId, Category> = BTreeMap::new();
    for category in products.iter().filter_map(|p| p.category.as_ref()) {
        by_id
            .entry(category.id)
            .or_insert_with(|| category.clone());
    }
    by_id.into_values().collect()
}
