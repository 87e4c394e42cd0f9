pub mod http;
pub mod memory;

use std::fmt;

use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub use http::HttpPageSource;
pub use memory::MemoryPageSource;

// selection membership is keyed on this, never on record equality
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    // accepts the id forms paged APIs actually emit: strings and integers
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug)]
pub struct Record {
    pub id: RecordId,
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn from_value(value: &Value, id_field: &str) -> Option<Self> {
        let fields = value.as_object()?.clone();
        let id = RecordId::from_value(fields.get(id_field)?)?;
        Some(Self { id, fields })
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

#[derive(Clone, Debug)]
pub struct Page {
    pub index: u64,
    pub page_size: usize,
    pub records: Vec<Record>,
    pub total_records: Option<u64>,
}

impl Page {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid API URL: {url}")]
    InvalidUrl { url: String },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request for page {page} failed: {source}")]
    Http {
        page: u64,
        #[source]
        source: reqwest::Error,
    },

    #[error("request for page {page} returned status {status}")]
    Status { page: u64, status: u16 },

    #[error("failed to decode page {page}: {source}")]
    Decode {
        page: u64,
        #[source]
        source: serde_json::Error,
    },

    #[error("record {index} on page {page} is missing id field '{id_field}'")]
    MissingId {
        page: u64,
        index: usize,
        id_field: String,
    },
}

// one page per fetch, scoped by a 1-based index; implementations own their
// in-flight tracking and retry policy
pub trait PageSource: Send + Sync {
    fn fetch_page(&self, page: u64) -> BoxFuture<'_, Result<Page, SourceError>>;
}

impl PageSource for Box<dyn PageSource> {
    fn fetch_page(&self, page: u64) -> BoxFuture<'_, Result<Page, SourceError>> {
        (**self).fetch_page(page)
    }
}
