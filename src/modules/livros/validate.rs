//! Field validation for inbound book payloads.
//!
//! The payload stays a loosely typed `serde_json::Value` until it passes
//! here. Rules form an ordered list of independent checks; every rule runs
//! and violations accumulate, so a single bad request reports all of its
//! problems at once.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use livraria_http::error::{RuleCode, Violation};

static DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{2}-\d{2}-\d{4}$").expect("date pattern is a valid regex")
});

type Rule = fn(&Value) -> Option<Violation>;

/// Fixed rule order; the response lists violations in this order.
const RULES: &[Rule] = &[
    check_title,
    check_page_count,
    check_publication_date,
    check_price,
    check_origin,
];

/// Validates a candidate book payload, returning every violated rule.
///
/// An empty vec means the payload is acceptable for persistence. Used
/// identically for insert and update.
pub fn validate_book(payload: &Value) -> Vec<Violation> {
    RULES.iter().filter_map(|rule| rule(payload)).collect()
}

fn check_title(payload: &Value) -> Option<Violation> {
    let field = payload.get("title");
    match field.and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => None,
        _ => Some(Violation::new(
            RuleCode::EmptyField,
            "title",
            "the book title is required",
            render(field),
        )),
    }
}

fn check_page_count(payload: &Value) -> Option<Violation> {
    let field = payload.get("pageCount");
    match field.and_then(Value::as_i64) {
        Some(pages) if pages >= 1 => None,
        _ => Some(Violation::new(
            RuleCode::InvalidInteger,
            "pageCount",
            "the page count must be an integer greater than zero",
            render(field),
        )),
    }
}

fn check_publication_date(payload: &Value) -> Option<Violation> {
    let field = payload.get("publicationDate");
    let raw = field.and_then(Value::as_str).unwrap_or("");
    if raw.trim().is_empty() {
        return Some(Violation::new(
            RuleCode::EmptyField,
            "publicationDate",
            "the publication date is required",
            render(field),
        ));
    }

    if !DATE_PATTERN.is_match(raw) {
        return Some(Violation::new(
            RuleCode::InvalidFormat,
            "publicationDate",
            "invalid date format, use dd-mm-yyyy",
            render(field),
        ));
    }

    None
}

fn check_price(payload: &Value) -> Option<Violation> {
    let field = payload.get("price");
    match field {
        Some(Value::Number(_)) => None,
        _ => Some(Violation::new(
            RuleCode::NotNumeric,
            "price",
            "the price must be a numeric value",
            render(field),
        )),
    }
}

fn check_origin(payload: &Value) -> Option<Violation> {
    let field = payload.get("origin");
    let origin = match field {
        Some(Value::Object(map)) => map,
        _ => {
            return Some(Violation::new(
                RuleCode::NotObject,
                "origin",
                "the 'origin' field must be an object",
                render(field),
            ))
        }
    };

    let present = |key: &str| {
        matches!(origin.get(key), Some(Value::String(s)) if !s.trim().is_empty())
    };
    if present("author") && present("publisher") {
        None
    } else {
        Some(Violation::new(
            RuleCode::MissingSubfields,
            "origin",
            "the 'origin' field must contain 'author' and 'publisher'",
            render(field),
        ))
    }
}

/// Renders the rejected input for the envelope's `value` entry.
fn render(field: Option<&Value>) -> String {
    match field {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
