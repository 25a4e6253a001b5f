//! # Validation Module
//!
//! Input validation utilities for Boutik.
//!
//! ## Validation Strategy
//! Validation runs in the service layer before business logic: type-level
//! checks happen at deserialization, business rules here, and the database
//! backs it all with NOT NULL / UNIQUE constraints. Multiple layers catch
//! different errors.

use crate::error::ValidationError;
use crate::{MAX_LINE_QUANTITY, MAX_NAME_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty (after trimming)
/// - Must be at most 200 characters
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

/// Validates and normalizes a Senegalese phone number.
///
/// ## Accepted Formats
/// - `77XXXXXXX` (9 digits)
/// - `+22177XXXXXXX`
/// - Any of the above with spaces, dots or dashes mixed in
///
/// ## Example
/// ```rust
/// use boutik_core::validation::normalize_phone;
///
/// assert_eq!(normalize_phone("77 123 45 67").unwrap(), "771234567");
/// assert_eq!(normalize_phone("+221771234567").unwrap(), "+221771234567");
/// assert!(normalize_phone("0612345678").is_err());
/// ```
pub fn normalize_phone(raw: &str) -> ValidationResult<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();

    let digits = cleaned.strip_prefix("+221").unwrap_or(&cleaned);

    let valid = digits.len() == 9
        && digits.starts_with("77")
        && digits.chars().all(|c| c.is_ascii_digit());

    if valid {
        Ok(cleaned)
    } else {
        Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "expected 77XXXXXXX with optional +221 prefix".to_string(),
        })
    }
}

/// Validates a password.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.len() < 6 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 6,
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price in francs (must not be negative).
pub fn validate_price(price: i64) -> ValidationResult<()> {
    if price < 0 {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }
    Ok(())
}

/// Validates a cart quantity: positive and within the per-line cap.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity < 1 || quantity > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }
    Ok(())
}

// =============================================================================
// Slug Derivation
// =============================================================================

/// Derives a URL-friendly slug from a product name.
///
/// Lowercases, transliterates common French accents, and collapses any
/// other run of non-alphanumeric characters into a single dash.
///
/// ## Example
/// ```rust
/// use boutik_core::validation::slugify;
///
/// assert_eq!(slugify("Parfum Marasi 50ml"), "parfum-marasi-50ml");
/// assert_eq!(slugify("Chemise Élégante — Été"), "chemise-elegante-ete");
/// ```
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true; // suppress a leading dash

    for c in name.chars() {
        let mapped = fold_accent(c);
        if mapped.is_ascii_alphanumeric() {
            slug.push(mapped.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }

    if slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Maps common accented characters to their ASCII base letter.
fn fold_accent(c: char) -> char {
    match c.to_lowercase().next().unwrap_or(c) {
        'à' | 'â' | 'ä' => 'a',
        'ç' => 'c',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'î' | 'ï' => 'i',
        'ô' | 'ö' => 'o',
        'ù' | 'û' | 'ü' => 'u',
        other => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
