//! # Validation Module
//!
//! Field rules for products and staff accounts.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractor (serde)                                        │
//! │  └── Shape and types of the JSON body                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  └── sku charset, name length, price/stock ≥ 0, expiry date             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                        │
//! │  ├── UNIQUE(sku), UNIQUE(username)                                      │
//! │  └── CHECK (stock >= 0), CHECK (price_cents >= 0)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use farmasys_core::validation::{parse_expiry, validate_sku};
//!
//! assert!(validate_sku("750100010005").is_ok());
//! assert_eq!(parse_expiry("").unwrap(), None);
//! assert!(parse_expiry("2026-05-20").unwrap().is_some());
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{NewProduct, ProductPatch};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const SKU_MAX: usize = 50;
const NAME_MAX: usize = 200;
const CATEGORY_MAX: usize = 100;
const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 50;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (usually the package barcode).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only letters, digits, hyphens and underscores
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.chars().count() > SKU_MAX {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: SKU_MAX,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name: 1 to 200 characters after trimming.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > NAME_MAX {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: NAME_MAX,
        });
    }

    Ok(())
}

/// Categories are optional; only the length is limited.
pub fn validate_category(category: &str) -> ValidationResult<()> {
    if category.trim().chars().count() > CATEGORY_MAX {
        return Err(ValidationError::TooLong {
            field: "category".to_string(),
            max: CATEGORY_MAX,
        });
    }
    Ok(())
}

/// Parses an expiry date in `YYYY-MM-DD` form. Empty text means no date.
pub fn parse_expiry(text: &str) -> ValidationResult<Option<NaiveDate>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| ValidationError::InvalidFormat {
            field: "expiry".to_string(),
            reason: "expected YYYY-MM-DD".to_string(),
        })
}

/// Usernames: 3 to 50 characters, letters, digits, `.`, `-`, `_`.
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();
    let len = username.chars().count();

    if len == 0 {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }
    if len < USERNAME_MIN {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: USERNAME_MIN,
        });
    }
    if len > USERNAME_MAX {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: USERNAME_MAX,
        });
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '_'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, numbers, dots, hyphens, and underscores"
                .to_string(),
        });
    }
    Ok(())
}

/// Passwords only need to be present.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Prices may be zero (samples, promotions) but never negative.
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Stock counts are whole units, never negative.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

// =============================================================================
// Aggregate Validators
// =============================================================================

impl NewProduct {
    /// Checks every field of a new product.
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(id) = &self.id {
            if id.trim().is_empty() {
                return Err(ValidationError::Required {
                    field: "id".to_string(),
                });
            }
        }
        validate_sku(&self.sku)?;
        validate_product_name(&self.name)?;
        validate_stock(self.stock)?;
        validate_price(self.price)?;
        validate_category(&self.category)
    }
}

impl ProductPatch {
    /// Checks the fields present in the patch.
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(sku) = &self.sku {
            validate_sku(sku)?;
        }
        if let Some(name) = &self.name {
            validate_product_name(name)?;
        }
        if let Some(stock) = self.stock {
            validate_stock(stock)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(category) = &self.category {
            validate_category(category)?;
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn new_product() -> NewProduct {
        NewProduct {
            id: None,
            sku: "750100010005".to_string(),
            name: "Ibuprofeno 400mg".to_string(),
            stock: 50,
            price: Money::from_cents(450),
            expiry: NaiveDate::from_ymd_opt(2026, 5, 20),
            category: "Analgésico".to_string(),
        }
    }

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("750100010001").is_ok());
        assert!(validate_sku("AMOX-250_CAPS").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"7".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Omeprazol 20mg").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(201)).is_err());
        // Accented names count characters, not bytes
        assert!(validate_product_name(&"á".repeat(200)).is_ok());
    }

    #[test]
    fn test_parse_expiry() {
        assert_eq!(parse_expiry("  ").unwrap(), None);
        assert_eq!(
            parse_expiry("2027-02-01").unwrap(),
            NaiveDate::from_ymd_opt(2027, 2, 1)
        );
        assert!(parse_expiry("01/02/2027").is_err());
        assert!(parse_expiry("2027-02-30").is_err());
    }

    #[test]
    fn test_numeric_rules() {
        assert!(validate_price(Money::zero()).is_ok());
        assert!(validate_price(Money::from_cents(-1)).is_err());
        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(-5).is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("admin").is_ok());
        assert!(validate_username("maria.lopez").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("no spaces").is_err());
        assert!(validate_password("").is_err());
        assert!(validate_password("123").is_ok());
    }

    #[test]
    fn test_new_product_validate() {
        assert!(new_product().validate().is_ok());

        let mut bad = new_product();
        bad.stock = -1;
        assert!(matches!(
            bad.validate(),
            Err(ValidationError::OutOfRange { ref field, .. }) if field == "stock"
        ));

        let mut bad = new_product();
        bad.name = String::new();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_patch_validate_checks_present_fields_only() {
        assert!(ProductPatch::default().validate().is_ok());
        let patch = ProductPatch {
            price: Some(Money::from_cents(-100)),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }
}
