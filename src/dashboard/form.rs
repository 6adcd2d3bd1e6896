use thiserror::Error;

use crate::catalog::{CategoryId, Product, ProductDraft, DEFAULT_DESCRIPTION, PLACEHOLDER_IMAGE};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormField {
    Title,
    Price,
    Description,
    Category,
    Images,
}

impl FormField {
    pub const ALL: [FormField; 5] = [
        FormField::Title,
        FormField::Price,
        FormField::Description,
        FormField::Category,
        FormField::Images,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "title" => Some(Self::Title),
            "price" => Some(Self::Price),
            "description" | "desc" => Some(Self::Description),
            "category" | "categoryid" | "category_id" => Some(Self::Category),
            "images" | "image" => Some(Self::Images),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FormField::Title => "title",
            FormField::Price => "price",
            FormField::Description => "description",
            FormField::Category => "category",
            FormField::Images => "images",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub field: FormField,
    pub message: String,
}

impl ValidationError {
    fn new(field: FormField, message: &str) -> Self {
        Self {
            field,
            message: message.to_string(),
        }
    }
}

/// Raw operator input, exactly as typed. Nothing here is trusted until it
/// goes through [`validate_create`] or [`coerce_update`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductForm {
    pub title: String,
    pub price: String,
    pub description: String,
    pub category: String,
    pub images: String,
}

impl ProductForm {
    pub fn from_product(product: &Product) -> Self {
        Self {
            title: product.title.clone(),
            price: product.price.to_string(),
            description: product.description_or_empty().to_string(),
            category: product
                .category
                .as_ref()
                .map(|c| c.id.to_string())
                .unwrap_or_else(|| "1".to_string()),
            images: product.images.join(", "),
        }
    }

    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::Title => &self.title,
            FormField::Price => &self.price,
            FormField::Description => &self.description,
            FormField::Category => &self.category,
            FormField::Images => &self.images,
        }
    }

    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FormField::Title => self.title = value,
            FormField::Price => self.price = value,
            FormField::Description => self.description = value,
            FormField::Category => self.category = value,
            FormField::Images => self.images = value,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DraftDefaults {
    pub description: String,
    pub placeholder_image: String,
}

impl Default for DraftDefaults {
    fn default() -> Self {
        Self {
            description: DEFAULT_DESCRIPTION.to_string(),
            placeholder_image: PLACEHOLDER_IMAGE.to_string(),
        }
    }
}

pub fn split_images(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|url| url.trim())
        .filter(|url| !url.is_empty())
        .map(|url| url.to_string())
        .collect()
}

fn parse_price(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|p| p.is_finite())
}

fn parse_category(raw: &str) -> Option<CategoryId> {
    raw.trim().parse::<CategoryId>().ok().filter(|id| *id != 0)
}

/// Checks a new product in order (title, price, category) and stops at the
/// first failure.
pub fn validate_create(
    form: &ProductForm,
    defaults: &DraftDefaults,
) -> Result<ProductDraft, ValidationError> {
    let title = form.title.trim();
    if title.is_empty() {
        return Err(ValidationError::new(
            FormField::Title,
            "Please enter a product title",
        ));
    }

    let price = match parse_price(&form.price) {
        Some(p) if p > 0.0 => p,
        _ => {
            return Err(ValidationError::new(
                FormField::Price,
                "Please enter a valid product price",
            ))
        }
    };

    let category_id = parse_category(&form.category).ok_or_else(|| {
        ValidationError::new(FormField::Category, "Please select a product category")
    })?;

    let description = match form.description.trim() {
        "" => defaults.description.clone(),
        d => d.to_string(),
    };

    let mut images = split_images(form.images.trim());
    if images.is_empty() {
        images.push(defaults.placeholder_image.clone());
    }

    Ok(ProductDraft {
        title: title.to_string(),
        price,
        description,
        category_id,
        images,
    })
}

/// Turns an edited detail form into an update body. Only type coercion
/// happens here: values that do not parse are rejected, nothing else is.
pub fn coerce_update(form: &ProductForm) -> Result<ProductDraft, ValidationError> {
    let price = parse_price(&form.price)
        .ok_or_else(|| ValidationError::new(FormField::Price, "Price must be a number"))?;
    let category_id = form
        .category
        .trim()
        .parse::<CategoryId>()
        .map_err(|_| ValidationError::new(FormField::Category, "Category must be a numeric id"))?;

    Ok(ProductDraft {
        title: form.title.clone(),
        price,
        description: form.description.clone(),
        category_id,
        images: split_images(&form.images),
    })
}
