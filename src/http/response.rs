//! JSON reply writing.
//!
//! # Responsibilities
//! - Serialize a reply with the given status and a JSON content type
//! - Write absent values and empty sequences as `[]`
//! - Log (and swallow) serialization failures
//!
//! # Design Decisions
//! - Whether a value counts as absent is decided by its type through
//!   [`JsonReply`], not by inspecting it at runtime
//! - A failed serialization keeps the chosen status and sends an empty body;
//!   the handler has already committed to the reply

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Content type of every JSON reply.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

const EMPTY_ARRAY: &[u8] = b"[]";

/// A value that can be written with [`reply_json`].
///
/// Types that can be "nothing" (optional values, sequences) override
/// [`JsonReply::is_absent`] so they go out as `[]` instead of `null` or an
/// encoder-specific empty form. Plain structs only need an empty impl:
///
/// ```rust,ignore
/// impl JsonReply for User {}
/// ```
pub trait JsonReply: Serialize {
    fn is_absent(&self) -> bool {
        false
    }
}

impl<T: JsonReply> JsonReply for Option<T> {
    fn is_absent(&self) -> bool {
        self.as_ref().map_or(true, JsonReply::is_absent)
    }
}

impl<T: Serialize> JsonReply for Vec<T> {
    fn is_absent(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Serialize> JsonReply for [T] {
    fn is_absent(&self) -> bool {
        self.is_empty()
    }
}

impl<T: JsonReply + ?Sized> JsonReply for &T {
    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }
}

impl<T: JsonReply + ?Sized> JsonReply for Box<T> {
    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }
}

impl JsonReply for serde_json::Value {
    fn is_absent(&self) -> bool {
        match self {
            serde_json::Value::Null => true,
            serde_json::Value::Array(items) => items.is_empty(),
            _ => false,
        }
    }
}

// Maps are never absent: an empty map is written as `{}`.
impl<K: Serialize, V: Serialize, H: BuildHasher> JsonReply for HashMap<K, V, H> {}
impl<K: Serialize, V: Serialize> JsonReply for BTreeMap<K, V> {}

/// Build a JSON reply with `status`.
///
/// `request_id` only tags the log record written when serialization fails.
pub fn reply_json<T>(request_id: Option<&str>, status: StatusCode, reply: &T) -> Response
where
    T: JsonReply + ?Sized,
{
    let body = if reply.is_absent() {
        Body::from(EMPTY_ARRAY)
    } else {
        match serde_json::to_vec(reply) {
            Ok(bytes) => Body::from(bytes),
            Err(err) => {
                tracing::error!(request_id, error = %err, "could not send http JSON reply");
                Body::empty()
            }
        }
    };

    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::Error as _;

    #[derive(Serialize)]
    struct User {
        id: u32,
        name: &'static str,
    }

    impl JsonReply for User {}

    struct Broken;

    impl Serialize for Broken {
        fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("cannot encode"))
        }
    }

    impl JsonReply for Broken {}

    async fn body_of(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn test_absent_reply_is_empty_array() {
        let response = reply_json(None, StatusCode::OK, &None::<Vec<User>>);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json; charset=UTF-8"
        );
        assert_eq!(body_of(response).await, b"[]");
    }

    #[tokio::test]
    async fn test_empty_sequence_is_empty_array() {
        let users: Vec<User> = Vec::new();
        let response = reply_json(None, StatusCode::OK, &users);
        assert_eq!(body_of(response).await, b"[]");

        let response = reply_json(None, StatusCode::OK, &serde_json::Value::Null);
        assert_eq!(body_of(response).await, b"[]");
    }

    #[tokio::test]
    async fn test_value_is_encoded() {
        let users = vec![User { id: 1, name: "ada" }];
        let response = reply_json(Some("req-1"), StatusCode::CREATED, &users);
        assert_eq!(response.status(), StatusCode::CREATED);

        let body: serde_json::Value = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(body, serde_json::json!([{"id": 1, "name": "ada"}]));
    }

    #[tokio::test]
    async fn test_empty_map_is_not_absent() {
        let map: BTreeMap<String, u32> = BTreeMap::new();
        let response = reply_json(None, StatusCode::OK, &map);
        assert_eq!(body_of(response).await, b"{}");
    }

    #[tokio::test]
    async fn test_serialization_failure_keeps_status() {
        let response = reply_json(Some("req-2"), StatusCode::ACCEPTED, &Broken);
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(body_of(response).await.is_empty());
    }
}
