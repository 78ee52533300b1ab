//! Request decoding shared by the handlers.
//!
//! Bodies are decoded as loosely-typed JSON and each field is coerced by hand
//! so that type errors produce the field-specific messages clients rely on
//! instead of a generic deserialization failure.

use crate::errors::ServiceError;
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};
use std::num::IntErrorKind;
use std::str::FromStr;

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// A JSON object body, decoded whatever the `Content-Type` says.
#[derive(Debug, Clone, Default)]
pub struct JsonPayload(pub Map<String, Value>);

impl JsonPayload {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }
}

#[async_trait]
impl<S> FromRequest<S> for JsonPayload
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| {
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ServiceError::PayloadTooLarge("Request body is too large".to_string())
            } else {
                ServiceError::validation("Could not read request body")
            }
        })?;

        parse_object(&bytes).map(JsonPayload)
    }
}

/// Parses `bytes` as a JSON object.
pub fn parse_object(bytes: &[u8]) -> Result<Map<String, Value>, ServiceError> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ServiceError::validation("Request body must be a JSON object")),
        Err(_) => Err(ServiceError::validation("Request body must be valid JSON")),
    }
}

/// Trimmed string value of a required text field; anything else counts as
/// absent.
pub fn required_text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Parses a price given as a JSON string or number into an exact decimal.
///
/// Sign and scale checks happen later, when the product is validated.
pub fn parse_price(value: Option<&Value>) -> Result<Decimal, ServiceError> {
    let invalid = || ServiceError::validation("'price' must be a valid decimal");

    let text = match value {
        Some(Value::String(text)) => text.trim().to_string(),
        Some(Value::Number(number)) => number.to_string(),
        _ => return Err(invalid()),
    };

    parse_decimal(&text).ok_or_else(invalid)
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    if text.is_empty() {
        return None;
    }
    Decimal::from_str_exact(text)
        .or_else(|_| Decimal::from_str(text))
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
        .or_else(|| clamp_scientific(text))
}

/// Scientific notation outside the range `Decimal` can hold. Values too small
/// keep only their sign (they round to zero at any price scale); values too
/// large saturate so the range check rejects them.
fn clamp_scientific(text: &str) -> Option<Decimal> {
    const MAX_SCALE: i64 = 28;

    let (mantissa, exponent) = text.split_once(|c: char| c == 'e' || c == 'E')?;
    let mantissa = Decimal::from_str(mantissa).ok()?;
    let exponent: i64 = exponent.parse().ok()?;

    if mantissa.is_zero() {
        return Some(Decimal::ZERO);
    }

    let mut digits = mantissa.mantissa();
    let mut scale = i64::from(mantissa.scale()).saturating_sub(exponent);
    if scale < 0 {
        return Some(if mantissa.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        });
    }

    while scale > MAX_SCALE && digits != 0 {
        digits /= 10;
        scale -= 1;
    }
    if digits == 0 {
        let sign = if mantissa.is_sign_negative() { -1 } else { 1 };
        return Some(Decimal::new(sign, MAX_SCALE as u32));
    }

    Decimal::try_from_i128_with_scale(digits, scale as u32).ok()
}

/// Parses the optional `quantity` field. Absent means zero.
pub fn parse_quantity(value: Option<&Value>) -> Result<i32, ServiceError> {
    let not_integer = || ServiceError::validation("'quantity' must be an integer");
    let negative = || ServiceError::validation("'quantity' must be non-negative");
    let too_large = || {
        ServiceError::validation(format!("'quantity' must not exceed {}", i32::MAX))
    };

    let wide: i64 = match value {
        None => return Ok(0),
        Some(Value::Number(number)) => {
            if let Some(int) = number.as_i64() {
                int
            } else if number.as_u64().is_some() {
                return Err(too_large());
            } else {
                match number.as_f64() {
                    Some(float) if float.is_finite() && float.fract() == 0.0 => {
                        if float < 0.0 {
                            return Err(negative());
                        }
                        if float > f64::from(i32::MAX) {
                            return Err(too_large());
                        }
                        float as i64
                    }
                    _ => return Err(not_integer()),
                }
            }
        }
        Some(Value::String(text)) => match text.trim().parse::<i64>() {
            Ok(int) => int,
            Err(err) => {
                return Err(match err.kind() {
                    IntErrorKind::PosOverflow => too_large(),
                    IntErrorKind::NegOverflow => negative(),
                    _ => not_integer(),
                })
            }
        },
        Some(_) => return Err(not_integer()),
    };

    if wide < 0 {
        return Err(negative());
    }
    i32::try_from(wide).map_err(|_| too_large())
}

/// Outcome of decoding an id that references another row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    /// Absent, or one of the empty values `null`, `false`, `0`, `""`, `[]`, `{}`.
    Missing,
    /// Present but not an integer id.
    Malformed,
    Id(i32),
}

impl Reference {
    pub fn parse(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) | Some(Value::Bool(false)) => Reference::Missing,
            Some(Value::Bool(true)) => Reference::Malformed,
            Some(Value::Number(number)) => {
                if let Some(int) = number.as_i64() {
                    if int == 0 {
                        Reference::Missing
                    } else {
                        i32::try_from(int).map_or(Reference::Malformed, Reference::Id)
                    }
                } else {
                    match number.as_f64() {
                        Some(float) if float == 0.0 => Reference::Missing,
                        Some(float)
                            if float.fract() == 0.0
                                && float >= f64::from(i32::MIN)
                                && float <= f64::from(i32::MAX) =>
                        {
                            Reference::Id(float as i32)
                        }
                        _ => Reference::Malformed,
                    }
                }
            }
            Some(Value::String(text)) if text.is_empty() => Reference::Missing,
            Some(Value::String(text)) => text
                .trim()
                .parse::<i32>()
                .map_or(Reference::Malformed, Reference::Id),
            Some(Value::Array(items)) if items.is_empty() => Reference::Missing,
            Some(Value::Object(fields)) if fields.is_empty() => Reference::Missing,
            Some(_) => Reference::Malformed,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Reference::Missing)
    }

    pub fn id(&self) -> Option<i32> {
        match self {
            Reference::Id(id) => Some(*id),
            _ => None,
        }
    }
}

/// Optional id of a related row; absent or `null` means none.
pub fn optional_reference(field: &str, value: Option<&Value>) -> Result<Option<i32>, ServiceError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        other => Reference::parse(other)
            .id()
            .map(Some)
            .ok_or_else(|| ServiceError::validation(format!("Invalid '{}'", field))),
    }
}

/// Decimal rendered with exactly two fractional digits.
pub fn format_price(price: Decimal) -> String {
    let mut rounded = price.round_dp(2);
    rounded.rescale(2);
    rounded.to_string()
}

/// Absolute URL of `path`, built from the configured public base URL, else
/// the request's `Host` header, else left relative.
pub fn absolute_url(public_base_url: Option<&str>, headers: &HeaderMap, path: &str) -> String {
    if let Some(base) = public_base_url {
        return format!("{}{}", base, path);
    }

    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|host| !host.is_empty());

    match host {
        Some(host) => {
            let scheme = headers
                .get("x-forwarded-proto")
                .and_then(|value| value.to_str().ok())
                .filter(|proto| *proto == "https")
                .unwrap_or("http");
            format!("{}://{}{}", scheme, host, path)
        }
        None => path.to_string(),
    }
}
