use serde_json::Value;

use regsearch_core::{Error, RawResponse, Record, Result, ResultPage};

/// Decodes `{ results: [...], meta: {...} }` envelopes.
///
/// `meta.total` and `meta.results.total` are both accepted, as are
/// `meta.results.skip` (openFDA) and `meta.page` (1-based) for the offset.
/// A missing `results` key is an empty page.
pub struct ResponseDecoder;

impl ResponseDecoder {
    pub fn decode_response<R: Record>(raw: &RawResponse) -> Result<ResultPage<R>> {
        if raw.is_success() {
            return Self::decode(&raw.body);
        }
        match Self::decode::<R>(&raw.body) {
            Err(err @ Error::Api { .. }) => Err(err),
            _ => Err(Error::Api { code: None, message: format!("HTTP {}", raw.status) }),
        }
    }

    pub fn decode<R: Record>(body: &[u8]) -> Result<ResultPage<R>> {
        let root: Value = serde_json::from_slice(body).map_err(|e| {
            tracing::debug!(body = %String::from_utf8_lossy(body), "response is not JSON");
            Error::decode(e.to_string(), body)
        })?;
        let Value::Object(mut root) = root else {
            return Err(Error::decode("expected a JSON object", body));
        };

        if let Some(err) = root.get("error") {
            let err = api_error(err);
            tracing::warn!(error = %err, "upstream rejected the query");
            return Err(err);
        }

        let items: Vec<R> = match root.remove("results") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(values)) => values.into_iter().map(R::from_json).collect(),
            Some(other) => {
                tracing::debug!(body = %String::from_utf8_lossy(body), "unexpected results type");
                return Err(Error::decode(format!("`results` must be an array, found {}", type_name(&other)), body));
            }
        };

        let meta = root.get("meta");
        let nested = meta.and_then(|m| m.get("results"));
        let lookup = |key: &str| {
            meta.and_then(|m| m.get(key)).and_then(as_count)
                .or_else(|| nested.and_then(|n| n.get(key)).and_then(as_count))
        };

        let limit = lookup("limit");
        let page_offset = match (lookup("skip"), meta.and_then(|m| m.get("page")).and_then(as_count)) {
            (Some(skip), _) => skip,
            (None, Some(page)) => page.saturating_sub(1).saturating_mul(limit.unwrap_or(items.len())),
            (None, None) => 0,
        };
        let page_size = limit.unwrap_or(items.len()).max(items.len());
        let total_count = lookup("total").unwrap_or_else(|| page_offset.saturating_add(items.len()));

        Ok(ResultPage { items, total_count, page_offset, page_size })
    }
}

fn api_error(err: &Value) -> Error {
    match err {
        Value::Object(obj) => {
            let code = obj.get("code").and_then(|c| match c {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            });
            let message = obj
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| code.clone())
                .unwrap_or_else(|| "Unknown error".to_string());
            Error::Api { code, message }
        }
        Value::String(s) => Error::Api { code: None, message: s.clone() },
        other => Error::Api { code: None, message: other.to_string() },
    }
}

fn as_count(v: &Value) -> Option<usize> {
    match v {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
