//! Jump straight to a view typed as `{center: [re, im], width, limit}`.
//!
//! The braces may be omitted and keys may be left unquoted; the text is
//! normalised to JSON before `serde_json` sees it.

use serde_json::Value;
use thiserror::Error;

use mandelgrid_core::{Complex, ViewportRequest};

#[derive(Debug, Error, PartialEq)]
pub(crate) enum DirectEntryError {
    #[error("could not read entry: {reason}")]
    Malformed { reason: String },

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("invalid `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// A parsed direct-entry payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DirectEntry {
    pub(crate) center: Complex,
    pub(crate) width: f64,
    pub(crate) limit: u32,
}

impl DirectEntry {
    /// A request centred on the entry at the current pixel width and dither.
    pub(crate) fn to_request(self, pixel_width: u32, dither: u32) -> ViewportRequest {
        ViewportRequest::centered(self.center, self.width, self.limit, pixel_width, None, dither)
    }
}

pub(crate) fn parse(input: &str) -> Result<DirectEntry, DirectEntryError> {
    let json = normalize(input);
    let value: Value = serde_json::from_str(&json).map_err(|e| DirectEntryError::Malformed {
        reason: e.to_string(),
    })?;
    let Value::Object(map) = value else {
        return Err(DirectEntryError::Malformed {
            reason: "expected an object".to_string(),
        });
    };

    let center = map.get("center").ok_or(DirectEntryError::MissingField("center"))?;
    let center = match center.as_array().map(Vec::as_slice) {
        Some([re, im]) => match (re.as_f64(), im.as_f64()) {
            (Some(re), Some(im)) => Complex::new(re, im),
            _ => return Err(invalid("center", "coordinates must be numbers")),
        },
        _ => return Err(invalid("center", "expected [re, im]")),
    };

    let width = map
        .get("width")
        .ok_or(DirectEntryError::MissingField("width"))?
        .as_f64()
        .ok_or_else(|| invalid("width", "expected a number"))?;
    if width <= 0.0 || !width.is_finite() {
        return Err(invalid("width", "must be positive"));
    }

    let limit = map
        .get("limit")
        .ok_or(DirectEntryError::MissingField("limit"))?
        .as_u64()
        .ok_or_else(|| invalid("limit", "expected a positive integer"))?;
    let limit = u32::try_from(limit)
        .ok()
        .filter(|&l| l >= 1)
        .ok_or_else(|| invalid("limit", "expected a positive integer"))?;

    Ok(DirectEntry {
        center,
        width,
        limit,
    })
}

fn invalid(field: &'static str, reason: &str) -> DirectEntryError {
    DirectEntryError::InvalidField {
        field,
        reason: reason.to_string(),
    }
}

/// Wrap in braces if needed and quote bare object keys.
fn normalize(input: &str) -> String {
    let trimmed = input.trim();
    let wrapped = if trimmed.starts_with('{') {
        trimmed.to_string()
    } else {
        format!("{{{trimmed}}}")
    };

    let chars: Vec<char> = wrapped.chars().collect();
    let mut out = String::with_capacity(wrapped.len() + 8);
    let mut in_string = false;
    let mut escaped = false;
    // Last significant character outside a string.
    let mut prev = ' ';
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
                prev = '"';
            }
            i += 1;
            continue;
        }

        if c == '"' {
            in_string = true;
            out.push(c);
            i += 1;
            continue;
        }

        if (c.is_ascii_alphabetic() || c == '_') && (prev == '{' || prev == ',') {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let key: String = chars[start..i].iter().collect();
            let mut j = i;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            if chars.get(j) == Some(&':') {
                out.push('"');
                out.push_str(&key);
                out.push('"');
            } else {
                out.push_str(&key);
            }
            prev = 'k';
            continue;
        }

        if !c.is_whitespace() {
            prev = c;
        }
        out.push(c);
        i += 1;
    }
    out
}
