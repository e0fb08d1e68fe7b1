//! Strict JSON request body decoding.
//!
//! # Responsibilities
//! - Reject non-JSON content types before the body is touched
//! - Cap the body at [`MAX_BODY_BYTES`]
//! - Decode exactly one JSON value, refusing unknown fields
//! - Classify serde failures into [`DecodeError`]
//!
//! # Design Decisions
//! - A missing or empty Content-Type header is accepted; any other value
//!   must be `application/json` (parameters ignored)
//! - Unknown fields are detected by the decoder itself, so target types do not
//!   need `#[serde(deny_unknown_fields)]` (types that do carry it are handled too)
//! - Syntax is checked over the whole value before the typed decode, so
//!   malformed input is never reported as a field problem
//! - A struct only decodes from a JSON object, never from an array
//! - Whitespace after the value is accepted, any other trailing byte is not
//! - Positions are the number of bytes consumed when the error was detected

use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Request},
    http::{header, HeaderMap},
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde::de::{Deserialize, DeserializeOwned, Deserializer, IgnoredAny, Visitor};
use serde_json::error::Category;

use crate::encoding::error::{BadRequestError, DecodeError};
use crate::http::request::RequestIdExt;

/// Largest accepted request body (1 MiB).
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

const JSON_MEDIA_TYPE: &str = "application/json";

/// Decode the request body as a single JSON value of type `T`.
///
/// Client mistakes come back as the matching [`DecodeError`] variant. Any
/// other failure is logged here, tagged with the request id when the headers
/// carry one, and returned as [`DecodeError::Internal`].
pub async fn decode_json<T>(headers: &HeaderMap, body: Body) -> Result<T, DecodeError>
where
    T: DeserializeOwned,
{
    check_content_type(headers)?;
    let bytes = read_body(body).await?;
    let result = parse_json(&bytes);

    if let Err(DecodeError::Internal(ref cause)) = result {
        tracing::error!(
            request_id = headers.request_id(),
            error = %cause,
            "unable to decode json request"
        );
    }

    result
}

fn check_content_type(headers: &HeaderMap) -> Result<(), DecodeError> {
    let Some(value) = headers.get(header::CONTENT_TYPE) else {
        return Ok(());
    };
    if value.is_empty() {
        return Ok(());
    }
    let raw = value
        .to_str()
        .map_err(|_| DecodeError::UnsupportedMediaType)?;

    let media_type = raw.split(';').next().unwrap_or_default().trim();
    if media_type.eq_ignore_ascii_case(JSON_MEDIA_TYPE) {
        Ok(())
    } else {
        Err(DecodeError::UnsupportedMediaType)
    }
}

async fn read_body(body: Body) -> Result<Bytes, DecodeError> {
    match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if err.is::<LengthLimitError>() => Err(DecodeError::TooLarge),
        Err(err) => Err(DecodeError::Internal(err)),
    }
}

fn is_json_whitespace(byte: &u8) -> bool {
    matches!(*byte, b' ' | b'\t' | b'\n' | b'\r')
}

fn parse_json<T>(bytes: &[u8]) -> Result<T, DecodeError>
where
    T: DeserializeOwned,
{
    if bytes.iter().all(is_json_whitespace) {
        return Err(DecodeError::Empty);
    }
    check_syntax(bytes)?;

    let mut unknown_field: Option<String> = None;
    let mut on_ignored = |path: serde_ignored::Path| {
        if unknown_field.is_none() {
            unknown_field = Some(path.to_string());
        }
    };
    let mut de = serde_json::Deserializer::from_slice(bytes);
    let result = serde_path_to_error::deserialize(serde_ignored::Deserializer::new(
        ObjectRoot(&mut de),
        &mut on_ignored,
    ));

    // The value is well-formed here, so the unknown field wins over any type
    // error (typically a required field that the client misspelled).
    if let Some(field) = unknown_field {
        return Err(DecodeError::UnknownField { field });
    }
    let value = result.map_err(|err| classify(bytes, err))?;

    de.end().map_err(|_| DecodeError::MultipleValues)?;
    Ok(value)
}

/// Check that the first value in `bytes` is well-formed JSON.
///
/// Runs before the typed decode so a syntax error anywhere in the value is
/// reported as such, even when the typed decode would have failed earlier.
fn check_syntax(bytes: &[u8]) -> Result<(), DecodeError> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    IgnoredAny::deserialize(&mut de)
        .map(|_| ())
        .map_err(|err| malformed(bytes, err))
}

fn classify(bytes: &[u8], err: serde_path_to_error::Error<serde_json::Error>) -> DecodeError {
    let field = err.path().to_string();
    let inner = err.into_inner();

    match inner.classify() {
        Category::Data => {
            let message = inner.to_string();
            if let Some(field) = backticked(&message, "unknown field `") {
                DecodeError::UnknownField { field }
            } else if let Some(field) = backticked(&message, "missing field `") {
                DecodeError::MissingField { field }
            } else {
                let offset = byte_offset(bytes, inner.line(), inner.column());
                DecodeError::InvalidValue { field, offset }
            }
        }
        _ => malformed(bytes, inner),
    }
}

fn malformed(bytes: &[u8], err: serde_json::Error) -> DecodeError {
    match err.classify() {
        Category::Eof => DecodeError::UnexpectedEof,
        Category::Io => DecodeError::Internal(Box::new(err)),
        Category::Syntax | Category::Data => DecodeError::Syntax {
            offset: byte_offset(bytes, err.line(), err.column()),
        },
    }
}

/// Extract the name serde wraps in backticks right after `prefix`.
fn backticked(message: &str, prefix: &str) -> Option<String> {
    let rest = message.strip_prefix(prefix)?;
    rest.split('`').next().map(str::to_owned)
}

/// Convert serde_json's 1-based line / column into a byte count from the start.
fn byte_offset(bytes: &[u8], line: usize, column: usize) -> usize {
    let line_start = if line <= 1 {
        0
    } else {
        bytes
            .iter()
            .enumerate()
            .filter(|(_, b)| **b == b'\n')
            .nth(line - 2)
            .map(|(i, _)| i + 1)
            .unwrap_or(bytes.len())
    };
    (line_start + column).min(bytes.len())
}

/// Deserializer adapter that only lets structs decode from JSON objects.
///
/// serde_json also fills a struct from an array of its fields in order; the
/// root of a request body has to be an object.
struct ObjectRoot<D>(D);

macro_rules! forward_to_inner {
    ($($method:ident)*) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, D::Error> {
            self.0.$method(visitor)
        }
    )*};
}

impl<'de, D: Deserializer<'de>> Deserializer<'de> for ObjectRoot<D> {
    type Error = D::Error;

    forward_to_inner! {
        deserialize_any deserialize_bool deserialize_i8 deserialize_i16 deserialize_i32
        deserialize_i64 deserialize_i128 deserialize_u8 deserialize_u16 deserialize_u32
        deserialize_u64 deserialize_u128 deserialize_f32 deserialize_f64 deserialize_char
        deserialize_str deserialize_string deserialize_bytes deserialize_byte_buf
        deserialize_option deserialize_unit deserialize_seq deserialize_map
        deserialize_identifier deserialize_ignored_any
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, D::Error> {
        self.0.deserialize_map(visitor)
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value, D::Error> {
        self.0.deserialize_unit_struct(name, visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value, D::Error> {
        self.0.deserialize_newtype_struct(name, visitor)
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value, D::Error> {
        self.0.deserialize_tuple(len, visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, D::Error> {
        self.0.deserialize_tuple_struct(name, len, visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, D::Error> {
        self.0.deserialize_enum(name, variants, visitor)
    }

    fn is_human_readable(&self) -> bool {
        self.0.is_human_readable()
    }
}

/// Extractor that runs [`decode_json`] and rejects with [`BadRequestError`].
///
/// ```rust,ignore
/// async fn create(StrictJson(user): StrictJson<NewUser>) -> Response { ... }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictJson<T>(pub T);

impl<T, S> FromRequest<S> for StrictJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = BadRequestError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let value = decode_json(&parts.headers, body).await?;
        Ok(StrictJson(value))
    }
}
