use serde_json::{json, Map, Value};

use regsearch_core::{BackendConfig, FetchRequest, FieldKind, FieldSpec, FilterSet, FilterValue, Method, Paging};
use regsearch_query::builder::format_date;
use regsearch_query::QueryExpression;

/// Plans the request for the page starting at `offset`.
///
/// GET backends receive the rendered expression in `search_param`; POST
/// backends receive the filters as a JSON body keyed by API field. Paging
/// parameters always travel in the query string.
pub fn plan_request(backend: &BackendConfig, expr: &QueryExpression, filters: &FilterSet, offset: usize) -> FetchRequest {
    let mut request = match backend.method {
        Method::Get => {
            let request = FetchRequest::get(&backend.endpoint);
            if expr.is_empty() { request } else { request.param(&backend.search_param, expr) }
        }
        Method::Post => FetchRequest::post(&backend.endpoint, post_body(backend, filters)),
    };
    if let Some(key) = &backend.api_key {
        request = request.param("api_key", key);
    }
    request = request.param("limit", backend.page_size);
    match backend.paging {
        Paging::Skip => request.param("skip", offset),
        Paging::Page => request.param("page", offset / backend.page_size.max(1) + 1),
    }
}

fn post_body(backend: &BackendConfig, filters: &FilterSet) -> Value {
    let mut body = Map::new();
    for (name, value) in filters.iter() {
        let spec = backend.field(name).cloned().unwrap_or_else(|| FieldSpec::new(name));
        let json = match value {
            FilterValue::Text(s) | FilterValue::Choice(s) => {
                let s = s.trim();
                if spec.kind == FieldKind::Choice && s.eq_ignore_ascii_case(spec.any_value.trim()) { continue; }
                Value::String(s.to_string())
            }
            FilterValue::Date(d) => Value::String(format_date(&spec, *d)),
            FilterValue::DateRange { from, to } => json!({
                "from": from.map(|d| format_date(&spec, d)),
                "to": to.map(|d| format_date(&spec, d)),
            }),
        };
        body.insert(spec.api_field().to_string(), json);
    }
    Value::Object(body)
}
