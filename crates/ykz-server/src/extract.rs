//! Query string extraction for HTML routes.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Query parameters that never reject the request.
///
/// A repeated key keeps its first value. If the parameters still do not
/// fit `T`, the handler gets `T::default()` and the page renders as if no
/// parameters were sent.
#[derive(Debug, Clone, Default)]
pub struct QueryParams<T>(pub T);

impl<T> QueryParams<T>
where
    T: DeserializeOwned + Default,
{
    /// Parses a raw query string (without the leading `?`).
    pub fn parse(query: &str) -> Self {
        let mut params = Map::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params
                .entry(key.into_owned())
                .or_insert_with(|| Value::String(value.into_owned()));
        }

        match serde_json::from_value(Value::Object(params)) {
            Ok(value) => Self(value),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring query parameters");
                Self(T::default())
            }
        }
    }
}

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::parse(parts.uri.query().unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::ToastQuery;
    use axum::http::Request;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Numbered {
        page: u32,
    }

    #[test]
    fn repeated_keys_keep_the_first_value() {
        let QueryParams(query) = QueryParams::<ToastQuery>::parse("toast=a&toast=b&type=ok&type=err");
        assert_eq!(query.toast.as_deref(), Some("a"));
        assert_eq!(query.kind.as_deref(), Some("ok"));
    }

    #[test]
    fn values_are_percent_decoded() {
        let QueryParams(query) = QueryParams::<ToastQuery>::parse("toast=Item%20added&type=ok");
        assert_eq!(query.toast.as_deref(), Some("Item added"));
    }

    #[test]
    fn mismatched_parameters_fall_back_to_default() {
        let QueryParams(query) = QueryParams::<Numbered>::parse("page=abc");
        assert_eq!(query, Numbered::default());
    }

    #[tokio::test]
    async fn extracts_from_request_uri() {
        let (mut parts, ()) = Request::builder()
            .uri("/dashboard?toast=first&toast=second")
            .body(())
            .unwrap()
            .into_parts();
        let QueryParams(query) = QueryParams::<ToastQuery>::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(query.toast.as_deref(), Some("first"));

        let (mut parts, ()) = Request::builder().uri("/").body(()).unwrap().into_parts();
        let QueryParams(query) = QueryParams::<ToastQuery>::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(query.toast().is_none());
    }
}
