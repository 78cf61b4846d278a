//! Back-office forms.
//!
//! Product and category forms arrive as `multipart/form-data` because they
//! can carry images; they are collected into [`MultipartFields`], validated,
//! and rebuilt as a [`FormData`] for the backend. Tags and shipping prices
//! are plain urlencoded forms sent to the backend as JSON.

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use boilerparts_api::{FormData, Product, WilayaPrices};
use boilerparts_core::{CategoryId, Price, ProductImageId, TagId};
use serde::Deserialize;

use super::validation::{FieldErrors, parse_price};

/// Largest accepted image, in bytes.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Most images accepted in one product submission.
pub const MAX_IMAGES_PER_SUBMIT: usize = 8;

/// Request body limit for upload routes.
pub const UPLOAD_BODY_LIMIT: usize = MAX_IMAGE_BYTES * MAX_IMAGES_PER_SUBMIT + 1024 * 1024;

const MAX_NAME_CHARS: usize = 200;

// =============================================================================
// Multipart
// =============================================================================

/// An uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    fn check(&self, field: &'static str, errors: &mut FieldErrors) {
        if !self.content_type.starts_with("image/") {
            errors.add(field, format!("{} is not an image", self.file_name));
        } else if self.bytes.len() > MAX_IMAGE_BYTES {
            errors.add(
                field,
                format!("{} is larger than {} MB", self.file_name, MAX_IMAGE_BYTES / (1024 * 1024)),
            );
        }
    }
}

/// Text values and files of a multipart submission, in arrival order.
#[derive(Debug, Default)]
pub struct MultipartFields {
    texts: Vec<(String, String)>,
    files: Vec<(String, Upload)>,
}

impl MultipartFields {
    /// Drain a multipart body.
    ///
    /// File inputs left empty by the browser (no name, no bytes) are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is malformed or exceeds the limit.
    pub async fn read(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut fields = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();

            match file_name {
                Some(file_name) => {
                    let bytes = field.bytes().await?;
                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    fields.files.push((
                        name,
                        Upload {
                            file_name,
                            content_type,
                            bytes: bytes.to_vec(),
                        },
                    ));
                }
                None => {
                    let text = field.text().await?;
                    fields.texts.push((name, text));
                }
            }
        }

        Ok(fields)
    }

    /// First text value for `name`, empty when absent.
    #[must_use]
    pub fn text(&self, name: &str) -> String {
        self.texts
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
            .unwrap_or_default()
    }

    /// Every value of a repeated field that parses as `T`.
    #[must_use]
    pub fn parsed<T: std::str::FromStr>(&self, name: &str) -> Vec<T> {
        self.texts
            .iter()
            .filter(|(key, _)| key == name)
            .filter_map(|(_, value)| value.parse().ok())
            .collect()
    }

    /// Whether a checkbox was ticked.
    #[must_use]
    pub fn is_checked(&self, name: &str) -> bool {
        self.texts.iter().any(|(key, _)| key == name)
    }

    /// Remove and return the files posted under `name`.
    pub fn take_files(&mut self, name: &str) -> Vec<Upload> {
        let (taken, kept) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|(key, _)| key == name);
        self.files = kept;
        taken.into_iter().map(|(_, upload)| upload).collect()
    }
}

// =============================================================================
// Products
// =============================================================================

/// Product create/edit form.
#[derive(Debug, Clone, Default)]
pub struct ProductInput {
    pub name: String,
    pub reference: String,
    pub brand: String,
    pub description: String,
    pub price: String,
    pub old_price: String,
    pub stock: String,
    pub is_active: bool,
    pub categories: Vec<CategoryId>,
    pub tags: Vec<TagId>,
    /// New gallery images.
    pub images: Vec<Upload>,
    /// Existing gallery images to delete.
    pub remove_images: Vec<ProductImageId>,
}

impl ProductInput {
    /// Blank form for a new product.
    #[must_use]
    pub fn new_product() -> Self {
        Self {
            stock: "0".to_string(),
            is_active: true,
            ..Self::default()
        }
    }

    /// Form prefilled from an existing product.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            reference: product.reference.clone().unwrap_or_default(),
            brand: product.brand.clone().unwrap_or_default(),
            description: product.description.clone(),
            price: product.price.amount().to_string(),
            old_price: product
                .old_price
                .map(|p| p.amount().to_string())
                .unwrap_or_default(),
            stock: product.stock.to_string(),
            is_active: product.is_active,
            categories: product.categories.iter().map(|c| c.id).collect(),
            tags: product.tags.iter().map(|t| t.id).collect(),
            images: Vec::new(),
            remove_images: Vec::new(),
        }
    }

    /// Collect the form from a multipart submission.
    #[must_use]
    pub fn from_fields(mut fields: MultipartFields) -> Self {
        Self {
            name: fields.text("name"),
            reference: fields.text("reference"),
            brand: fields.text("brand"),
            description: fields.text("description"),
            price: fields.text("price"),
            old_price: fields.text("old_price"),
            stock: fields.text("stock"),
            is_active: fields.is_checked("is_active"),
            categories: fields.parsed("categories"),
            tags: fields.parsed("tags"),
            remove_images: fields.parsed("remove_images"),
            images: fields.take_files("images"),
        }
    }

    /// Validate and build the multipart body for the backend.
    ///
    /// Optional text fields are always sent, empty when cleared, so an edit
    /// can blank them. `categories` and `tags` repeat once per id.
    ///
    /// # Errors
    ///
    /// Returns the per-field messages when a field is invalid.
    pub fn validate(&self) -> Result<FormData, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", "Required");
        } else if name.chars().count() > MAX_NAME_CHARS {
            errors.add("name", format!("At most {MAX_NAME_CHARS} characters"));
        }

        let price = parse_price(&self.price).map_err(|e| errors.add("price", e)).ok();

        let old_price: Option<Price> = if self.old_price.trim().is_empty() {
            None
        } else {
            parse_price(&self.old_price)
                .map_err(|e| errors.add("old_price", e))
                .ok()
        };
        if let (Some(price), Some(old)) = (price, old_price)
            && old <= price
        {
            errors.add("old_price", "Must be higher than the price");
        }

        let stock = self.stock.trim();
        let stock = if stock.is_empty() { "0" } else { stock };
        if stock.parse::<u32>().is_err() {
            errors.add("stock", "Enter a whole number, 0 or more");
        }

        if self.images.len() > MAX_IMAGES_PER_SUBMIT {
            errors.add("images", format!("At most {MAX_IMAGES_PER_SUBMIT} images at a time"));
        }
        for image in &self.images {
            image.check("images", &mut errors);
        }

        let Some(price) = price.filter(|_| errors.is_empty()) else {
            return Err(errors);
        };

        let mut form = FormData::new()
            .text("name", name)
            .text("reference", self.reference.trim())
            .text("brand", self.brand.trim())
            .text("description", self.description.trim())
            .text("price", price.amount().to_string())
            .text(
                "old_price",
                old_price.map(|p| p.amount().to_string()).unwrap_or_default(),
            )
            .text("stock", stock)
            .text("is_active", if self.is_active { "true" } else { "false" });

        for id in &self.categories {
            form = form.text("categories", id.to_string());
        }
        for id in &self.tags {
            form = form.text("tags", id.to_string());
        }
        for id in &self.remove_images {
            form = form.text("remove_images", id.to_string());
        }
        for image in &self.images {
            form = form.file(
                "uploaded_images",
                image.bytes.clone(),
                image.file_name.clone(),
                image.content_type.clone(),
            );
        }

        Ok(form)
    }
}

// =============================================================================
// Categories
// =============================================================================

/// Category create/edit form.
#[derive(Debug, Clone, Default)]
pub struct CategoryInput {
    pub name: String,
    pub description: String,
    pub image: Option<Upload>,
}

impl CategoryInput {
    #[must_use]
    pub fn from_fields(mut fields: MultipartFields) -> Self {
        Self {
            name: fields.text("name"),
            description: fields.text("description"),
            image: fields.take_files("image").into_iter().next(),
        }
    }

    /// Validate and build the multipart body. Without a new image the
    /// current one is kept.
    ///
    /// # Errors
    ///
    /// Returns the per-field messages when a field is invalid.
    pub fn validate(&self) -> Result<FormData, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", "Required");
        } else if name.chars().count() > MAX_NAME_CHARS {
            errors.add("name", format!("At most {MAX_NAME_CHARS} characters"));
        }
        if let Some(image) = &self.image {
            image.check("image", &mut errors);
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let form = FormData::new()
            .text("name", name)
            .text("description", self.description.trim());

        Ok(match &self.image {
            Some(image) => form.file(
                "image",
                image.bytes.clone(),
                image.file_name.clone(),
                image.content_type.clone(),
            ),
            None => form,
        })
    }
}

// =============================================================================
// Tags and Shipping
// =============================================================================

/// Tag create/rename form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagInput {
    #[serde(default)]
    pub name: String,
}

impl TagInput {
    /// The trimmed tag name.
    ///
    /// # Errors
    ///
    /// Returns a message for the `name` field when blank or too long.
    pub fn validate(&self) -> Result<&str, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", "Required");
        } else if name.chars().count() > MAX_NAME_CHARS {
            errors.add("name", format!("At most {MAX_NAME_CHARS} characters"));
        }
        if errors.is_empty() { Ok(name) } else { Err(errors) }
    }
}

/// Delivery prices for one wilaya.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShippingInput {
    #[serde(default)]
    pub home_delivery_price: String,
    #[serde(default)]
    pub desk_delivery_price: String,
    /// Checkbox: present when ticked.
    pub is_active: Option<String>,
}

impl ShippingInput {
    /// Validate into the backend payload.
    ///
    /// # Errors
    ///
    /// Returns the per-field messages when a price is invalid.
    pub fn validate(&self) -> Result<WilayaPrices, FieldErrors> {
        let mut errors = FieldErrors::new();
        let home = parse_price(&self.home_delivery_price)
            .map_err(|e| errors.add("home_delivery_price", e))
            .ok();
        let desk = parse_price(&self.desk_delivery_price)
            .map_err(|e| errors.add("desk_delivery_price", e))
            .ok();

        match (home, desk) {
            (Some(home_delivery_price), Some(desk_delivery_price)) => Ok(WilayaPrices {
                home_delivery_price,
                desk_delivery_price,
                is_active: self.is_active.is_some(),
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::Request;
    use boilerparts_api::FormValue;

    use super::*;

    const BOUNDARY: &str = "XbpX";

    fn multipart_request(parts: &[(&str, Option<(&str, &str)>, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (name, file, value) in parts {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match file {
                Some((file_name, content_type)) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
                )),
            }
            body.push_str(value);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));

        Request::builder()
            .method("POST")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn png(name: &str) -> Upload {
        Upload {
            file_name: name.to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        }
    }

    fn valid_product() -> ProductInput {
        ProductInput {
            name: "Carte électronique Saunier Duval".to_string(),
            price: "18500".to_string(),
            stock: "4".to_string(),
            is_active: true,
            categories: vec![CategoryId::new(2), CategoryId::new(5)],
            tags: vec![TagId::new(1)],
            ..ProductInput::default()
        }
    }

    #[tokio::test]
    async fn test_reads_multipart_product_form() {
        let request = multipart_request(&[
            ("name", None, "Pompe UPS 15-50"),
            ("price", None, "21000"),
            ("stock", None, "3"),
            ("is_active", None, "on"),
            ("categories", None, "4"),
            ("categories", None, "x"),
            ("categories", None, "7"),
            ("remove_images", None, "12"),
            ("images", Some(("pump.jpg", "image/jpeg")), "JPEGDATA"),
            ("images", Some(("", "application/octet-stream")), ""),
        ]);
        let multipart = Multipart::from_request(request, &()).await.unwrap();
        let fields = MultipartFields::read(multipart).await.unwrap();
        let input = ProductInput::from_fields(fields);

        assert_eq!(input.name, "Pompe UPS 15-50");
        assert!(input.is_active);
        assert_eq!(input.categories, vec![CategoryId::new(4), CategoryId::new(7)]);
        assert_eq!(input.remove_images, vec![ProductImageId::new(12)]);
        assert_eq!(input.images.len(), 1);
        assert_eq!(input.images[0].bytes, b"JPEGDATA");
    }

    #[test]
    fn test_product_form_data_layout() {
        let mut input = valid_product();
        input.images.push(png("front.png"));
        input.remove_images.push(ProductImageId::new(9));

        let form = input.validate().unwrap();

        assert_eq!(form.text_values("categories").collect::<Vec<_>>(), ["2", "5"]);
        assert_eq!(form.text_values("tags").collect::<Vec<_>>(), ["1"]);
        assert_eq!(form.text_values("remove_images").collect::<Vec<_>>(), ["9"]);
        assert_eq!(form.text_values("is_active").collect::<Vec<_>>(), ["true"]);
        assert_eq!(form.text_values("old_price").collect::<Vec<_>>(), [""]);
        assert_eq!(form.file_count(), 1);
        assert!(form.fields().iter().any(|(name, value)| {
            name == "uploaded_images"
                && matches!(value, FormValue::File { file_name, .. } if file_name == "front.png")
        }));
    }

    #[test]
    fn test_product_errors() {
        let input = ProductInput {
            name: " ".to_string(),
            price: "abc".to_string(),
            stock: "-1".to_string(),
            images: vec![Upload {
                content_type: "application/pdf".to_string(),
                ..png("manual.pdf")
            }],
            ..ProductInput::default()
        };

        let errors = input.validate().unwrap_err();
        assert!(errors.has("name"));
        assert!(errors.has("price"));
        assert!(errors.has("stock"));
        assert_eq!(errors.get("images"), Some("manual.pdf is not an image"));
    }

    #[test]
    fn test_old_price_must_exceed_price() {
        let input = ProductInput {
            old_price: "18000".to_string(),
            ..valid_product()
        };
        assert!(input.validate().unwrap_err().has("old_price"));

        let input = ProductInput {
            old_price: "20000".to_string(),
            ..valid_product()
        };
        let form = input.validate().unwrap();
        assert_eq!(form.text_values("old_price").collect::<Vec<_>>(), ["20000"]);
    }

    #[test]
    fn test_oversized_image_rejected() {
        let input = ProductInput {
            images: vec![Upload {
                bytes: vec![0; MAX_IMAGE_BYTES + 1],
                ..png("huge.png")
            }],
            ..valid_product()
        };
        assert!(input.validate().unwrap_err().has("images"));
    }

    #[test]
    fn test_category_image_is_optional() {
        let input = CategoryInput {
            name: "Vannes".to_string(),
            description: String::new(),
            image: None,
        };
        assert_eq!(input.validate().unwrap().file_count(), 0);

        let input = CategoryInput {
            image: Some(png("vannes.png")),
            ..input
        };
        assert_eq!(input.validate().unwrap().file_count(), 1);
    }

    #[test]
    fn test_shipping_input() {
        let input = ShippingInput {
            home_delivery_price: "800".to_string(),
            desk_delivery_price: "450".to_string(),
            is_active: Some("on".to_string()),
        };
        let prices = input.validate().unwrap();
        assert_eq!(prices.home_delivery_price, Price::from_dinars(800));
        assert!(prices.is_active);

        let input = ShippingInput {
            desk_delivery_price: String::new(),
            is_active: None,
            ..input
        };
        assert!(input.validate().unwrap_err().has("desk_delivery_price"));
    }

    #[test]
    fn test_tag_name_trimmed() {
        let input = TagInput {
            name: "  Vaillant ".to_string(),
        };
        assert_eq!(input.validate().unwrap(), "Vaillant");
        assert!(TagInput::default().validate().is_err());
    }
}
