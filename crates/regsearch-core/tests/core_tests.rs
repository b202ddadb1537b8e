use std::fs;
use tempfile::TempDir;

use regsearch_core::record::{from_json_or_default, lenient};
use regsearch_core::{BackendConfig, Config, Error, ErrorKind, FieldKind, Method, Paging, Record, SortValue};
use serde::Deserialize;
use serde_json::json;

const REGISTRATION_TOML: &str = r#"
[backend]
endpoint = "https://api.fda.gov/device/registrationlisting.json"
page_size = 25

[[backend.fields]]
name = "state"
field = "registration.us_agent.state_code"
kind = "exact"
group = "location"

[[backend.fields]]
name = "created"
field = "products.created_date"
kind = "year"
"#;

#[test]
fn load_from_dir_reads_backend_section() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), REGISTRATION_TOML).unwrap();

    let config = Config::load_from(tmp.path()).expect("load");
    let backend = config.backend().expect("backend");

    assert_eq!(backend.page_size, 25);
    assert_eq!(backend.method, Method::Get);
    assert_eq!(backend.paging, Paging::Skip);
    assert_eq!(backend.search_param, "search");
    let state = backend.field("state").expect("state field");
    assert_eq!(state.kind, FieldKind::Exact);
    assert_eq!(state.group.as_deref(), Some("location"));
    let created = backend.field("created").expect("created field");
    assert_eq!(created.date_format, "%Y-%m-%d");
    assert_eq!(created.any_value, "Any");
}

#[test]
fn missing_backend_section_is_an_error() {
    let config = Config::from_toml_str("[other]\nkey = 1\n");
    assert!(config.backend().is_err());
}

#[test]
fn zero_page_size_fails_validation() {
    let backend = BackendConfig::new("http://localhost/search").with_page_size(0);
    let err = backend.validate().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[derive(Debug, Default, Deserialize)]
struct Recall {
    #[serde(default, deserialize_with = "lenient")]
    recall_number: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    recalling_firm: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    voluntary_mandated: Option<String>,
}

impl Record for Recall {
    fn from_json(value: serde_json::Value) -> Self { from_json_or_default(value) }

    fn sort_value(&self, key: &str) -> Option<SortValue> {
        match key {
            "recall_number" => self.recall_number.as_deref().and_then(SortValue::text),
            "recalling_firm" => self.recalling_firm.as_deref().and_then(SortValue::text),
            _ => None,
        }
    }
}

#[test]
fn lenient_fields_degrade_individually() {
    let recall = Recall::from_json(json!({
        "recall_number": "Z-1234-2020",
        "recalling_firm": 42,
    }));
    assert_eq!(recall.recall_number.as_deref(), Some("Z-1234-2020"));
    assert!(recall.recalling_firm.is_none(), "wrong type becomes absent");
    assert!(recall.voluntary_mandated.is_none(), "missing stays absent");
}

#[test]
fn user_messages_follow_the_error_taxonomy() {
    assert_eq!(Error::NoCriteria.kind(), ErrorKind::NoCriteria);
    let api = Error::Api { code: Some("BAD_REQUEST".into()), message: "Invalid search".into() };
    assert_eq!(api.user_message(), "Invalid search");
    let decode = Error::decode("expected value", b"not json");
    assert_eq!(decode.raw_body(), Some("not json"));
    assert!(!decode.user_message().contains("not json"));
    let not_found = Error::Api { code: Some("NOT_FOUND".into()), message: "No matches found!".into() };
    assert!(not_found.is_no_matches());
}
