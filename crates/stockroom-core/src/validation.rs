//! # Validation Module
//!
//! Input validation for everything that enters through the admin front end.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: CLI argument parsing                                         │
//! │  └── Numbers parse, required flags present                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Names, prices, quantities, ids, dates, offsets                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (quantity >= 0), CHECK (price >= 0)                         │
//! │  └── Foreign keys                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{FixedOffset, NaiveDate, Offset, Utc};

use crate::error::ValidationError;
use crate::{MAX_LINE_QUANTITY, MAX_PRICE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn validate_name(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a product name: non-empty, at most 255 characters.
///
/// ```rust
/// use stockroom_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Кофе в зёрнах 1кг").is_ok());
/// assert!(validate_product_name("   ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_name("name", name, 255)
}

/// Validates a category name: non-empty, at most 255 characters.
pub fn validate_category_name(name: &str) -> ValidationResult<()> {
    validate_name("category name", name, 255)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an order or restock quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates an initial stock level. Zero is allowed.
pub fn validate_stock_level(qty: i64) -> ValidationResult<()> {
    if !(0..=MAX_LINE_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_LINE_QUANTITY,
        });
    }
    Ok(())
}

/// Validates a unit price. Zero is allowed (giveaways).
///
/// ## Rules
/// - Must not be negative
/// - Must not exceed MAX_PRICE
///
/// ```rust
/// use stockroom_core::validation::validate_price;
/// use stockroom_core::MAX_PRICE;
///
/// assert!(validate_price("sales_price", 150).is_ok());
/// assert!(validate_price("sales_price", 0).is_ok());
/// assert!(validate_price("sales_price", -1).is_err());
/// assert!(validate_price("sales_price", MAX_PRICE + 1).is_err());
/// ```
pub fn validate_price(field: &str, units: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE).contains(&units) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE,
        });
    }
    Ok(())
}

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates a UUID string.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Date & Offset Parsing
// =============================================================================

/// Parses a calendar date in `YYYY-MM-DD` form.
pub fn parse_date(field: &str, value: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "expected YYYY-MM-DD".to_string(),
        }
    })
}

/// Rejects a range whose start is after its end.
pub fn validate_date_range(from: NaiveDate, to: NaiveDate) -> ValidationResult<()> {
    if from > to {
        return Err(ValidationError::InvalidFormat {
            field: "date range".to_string(),
            reason: format!("{} is after {}", from, to),
        });
    }
    Ok(())
}

/// Parses a UTC offset such as `+05:00`, `-0330`, `+5`, `Z` or `UTC`.
///
/// ```rust
/// use stockroom_core::validation::parse_utc_offset;
///
/// assert_eq!(parse_utc_offset("+05:00").unwrap().local_minus_utc(), 18_000);
/// assert_eq!(parse_utc_offset("-0330").unwrap().local_minus_utc(), -12_600);
/// assert_eq!(parse_utc_offset("UTC").unwrap().local_minus_utc(), 0);
/// assert!(parse_utc_offset("Asia/Almaty").is_err());
/// ```
pub fn parse_utc_offset(value: &str) -> ValidationResult<FixedOffset> {
    let invalid = || ValidationError::InvalidFormat {
        field: "utc_offset".to_string(),
        reason: "expected ±HH:MM, ±HHMM, ±HH, Z or UTC".to_string(),
    };

    let value = value.trim();
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return Ok(Utc.fix());
    }

    let (sign, rest) = match value.as_bytes().first() {
        Some(b'+') => (1, &value[1..]),
        Some(b'-') => (-1, &value[1..]),
        _ => return Err(invalid()),
    };

    let (hours, minutes) = match rest.split_once(':') {
        Some(parts) => parts,
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, "0"),
    };

    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Coffee Beans 1kg").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
        // 255 Cyrillic characters are 510 bytes but still valid
        assert!(validate_product_name(&"Ж".repeat(255)).is_ok());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_stock_level() {
        assert!(validate_stock_level(0).is_ok());
        assert!(validate_stock_level(10).is_ok());
        assert!(validate_stock_level(-1).is_err());
    }

    #[test]
    fn test_validate_price_bounds() {
        assert!(validate_price("arrival_price", 0).is_ok());
        assert!(validate_price("arrival_price", MAX_PRICE).is_ok());
        assert!(validate_price("arrival_price", -1).is_err());

        match validate_price("arrival_price", 4_611_686_018_427_387_904) {
            Err(ValidationError::OutOfRange { field, max, .. }) => {
                assert_eq!(field, "arrival_price");
                assert_eq!(max, MAX_PRICE);
            }
            other => panic!("expected OutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("deadline", "2026-03-05").unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 5).unwrap()
        );
        assert!(parse_date("deadline", "05.03.2026").is_err());
        assert!(parse_date("deadline", "2026-02-30").is_err());
    }

    #[test]
    fn test_validate_date_range() {
        let a = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert!(validate_date_range(a, b).is_ok());
        assert!(validate_date_range(a, a).is_ok());
        assert!(validate_date_range(b, a).is_err());
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(parse_utc_offset("+05:00").unwrap().local_minus_utc(), 18_000);
        assert_eq!(parse_utc_offset("+5").unwrap().local_minus_utc(), 18_000);
        assert_eq!(parse_utc_offset("+0545").unwrap().local_minus_utc(), 20_700);
        assert_eq!(parse_utc_offset("-03:30").unwrap().local_minus_utc(), -12_600);
        assert_eq!(parse_utc_offset("z").unwrap().local_minus_utc(), 0);

        assert!(parse_utc_offset("05:00").is_err());
        assert!(parse_utc_offset("+25:00").is_err());
        assert!(parse_utc_offset("+05:75").is_err());
        assert!(parse_utc_offset("").is_err());
    }
}
