//! Non-finite value handling.
//!
//! NaN and infinities are never propagated raw. Metrics and record fields are
//! coerced to a sentinel where they are computed, and anything that still
//! reaches the serialization boundary is written as `null`.

use num_traits::Float;
use serde::Serializer;

/// Return `value` if it is finite, `fallback` otherwise.
#[inline]
pub fn finite_or<F: Float>(value: F, fallback: F) -> F {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Coerce a non-finite value to zero.
#[inline]
pub fn finite_or_zero<F: Float>(value: F) -> F {
    finite_or(value, F::zero())
}

/// Coerce a non-finite value to positive infinity.
///
/// Used for error-like quantities so that ranking never prefers them.
#[inline]
pub fn finite_or_infinity<F: Float>(value: F) -> F {
    finite_or(value, F::infinity())
}

/// Serialize a float as a JSON number when finite and `null` otherwise.
pub fn finite_or_null<S>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        serializer.serialize_none()
    }
}

/// Serialize a float slice element-wise with [`finite_or_null`] semantics.
pub fn finite_vec_or_null<S>(values: &[f64], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    use serde::ser::SerializeSeq;

    let mut seq = serializer.serialize_seq(Some(values.len()))?;
    for value in values {
        if value.is_finite() {
            seq.serialize_element(value)?;
        } else {
            seq.serialize_element(&Option::<f64>::None)?;
        }
    }
    seq.end()
}

/// Replace every non-finite number in a JSON tree with `null`.
///
/// `serde_json::Value` cannot hold NaN itself, but values built from foreign
/// payloads may carry numbers that overflow to infinity when read back as
/// `f64`; those are nulled as well.
pub fn sanitize_json(value: serde_json::Value) -> serde_json::Value {
    use serde_json::Value;

    match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) if !f.is_finite() => Value::Null,
            _ => Value::Number(n),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_json).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, sanitize_json(value)))
                .collect(),
        ),
        other => other,
    }
}
