//! Configuration loader and backend description.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (nested keys separated by `__`, e.g. `APP_BACKEND__PAGE_SIZE=50`).

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("."))
    }

    pub fn load_from(dir: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file(dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        Ok(Self { figment })
    }

    pub fn from_toml_str(toml: &str) -> Self {
        Self { figment: Figment::new().merge(Toml::string(toml)) }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// The validated `[backend]` section.
    pub fn backend(&self) -> anyhow::Result<BackendConfig> {
        let backend: BackendConfig = self.get("backend")?;
        backend.validate()?;
        Ok(backend)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    #[default]
    Get,
    Post,
}

/// How the page offset is expressed on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Paging {
    /// `skip=<offset>` (openFDA)
    #[default]
    Skip,
    /// `page=<offset / page_size + 1>`, 1-based
    Page,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Prefix match, or exact when the input is all digits.
    #[default]
    Text,
    Exact,
    /// Whole-year range.
    Year,
    Date,
    /// Enumerated value; `any_value` disables the filter.
    Choice,
}

/// Declares how one filter maps onto the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub kind: FieldKind,
    /// Fields sharing a group constrain the same concept and are OR'd.
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(default = "default_any_value")]
    pub any_value: String,
}

fn default_date_format() -> String { "%Y-%m-%d".to_string() }
fn default_any_value() -> String { "Any".to_string() }

impl FieldSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field: None,
            kind: FieldKind::Text,
            group: None,
            date_format: default_date_format(),
            any_value: default_any_value(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self { self.field = Some(field.into()); self }

    pub fn with_kind(mut self, kind: FieldKind) -> Self { self.kind = kind; self }

    pub fn in_group(mut self, group: impl Into<String>) -> Self { self.group = Some(group.into()); self }

    pub fn with_date_format(mut self, format: impl Into<String>) -> Self { self.date_format = format.into(); self }

    pub fn with_any_value(mut self, any: impl Into<String>) -> Self { self.any_value = any.into(); self }

    /// Backend field path; defaults to the filter name.
    pub fn api_field(&self) -> &str { self.field.as_deref().unwrap_or(&self.name) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub endpoint: String,
    #[serde(default)]
    pub method: Method,
    #[serde(default)]
    pub paging: Paging,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_search_param")]
    pub search_param: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

fn default_page_size() -> usize { 20 }
fn default_search_param() -> String { "search".to_string() }

impl BackendConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: Method::Get,
            paging: Paging::Skip,
            page_size: default_page_size(),
            search_param: default_search_param(),
            api_key: None,
            connect_timeout_ms: None,
            request_timeout_ms: None,
            fields: Vec::new(),
        }
    }

    pub fn with_method(mut self, method: Method) -> Self { self.method = method; self }

    pub fn with_paging(mut self, paging: Paging) -> Self { self.paging = paging; self }

    pub fn with_page_size(mut self, page_size: usize) -> Self { self.page_size = page_size; self }

    pub fn with_field(mut self, spec: FieldSpec) -> Self { self.fields.push(spec); self }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> { self.fields.iter().find(|f| f.name == name) }

    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(Error::InvalidConfig("backend.endpoint must not be empty".to_string()));
        }
        if self.page_size == 0 {
            return Err(Error::InvalidConfig("backend.page_size must be greater than zero".to_string()));
        }
        let mut seen = std::collections::HashSet::new();
        for f in &self.fields {
            if !seen.insert(f.name.as_str()) {
                return Err(Error::InvalidConfig(format!("duplicate field '{}'", f.name)));
            }
        }
        Ok(())
    }
}
