use std::num::NonZeroU32;
use std::time::Duration;

use governor::{Quota, RateLimiter};
use thiserror::Error;
use tokio::time::Instant;

use crate::session::{Delivery, Session, SessionError};
use crate::source::{
    http::HttpSourceOptions, HttpPageSource, MemoryPageSource, PageSource, Record, SourceError,
};

pub const DEFAULT_PAGE_SIZE: usize = 12;
pub const DEFAULT_ID_FIELD: &str = "id";

// default projection for artwork catalogue records
pub const DEFAULT_FIELDS: [&str; 6] = [
    "title",
    "place_of_origin",
    "inscriptions",
    "artist_title",
    "date_start",
    "date_end",
];

#[derive(Clone, Debug)]
pub enum RecordSource {
    Api { url: String },
    Inline(Vec<serde_json::Value>),
}

#[derive(Clone, Debug)]
pub struct Options {
    pub source: RecordSource,
    pub id_field: String,
    pub fields: Vec<String>,
    pub select: Option<u64>,
    pub start_page: u64,
    pub pages: Option<Vec<u64>>,
    pub max_pages: u64,
    pub page_size: usize,
    pub rate: u32,
    pub timeout_seconds: usize,
    pub proxy: Option<String>,
    pub user_agent: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            source: RecordSource::Api { url: String::new() },
            id_field: DEFAULT_ID_FIELD.to_string(),
            fields: DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect(),
            select: None,
            start_page: 1,
            pages: None,
            max_pages: 50,
            page_size: DEFAULT_PAGE_SIZE,
            rate: 5,
            timeout_seconds: 10,
            proxy: None,
            user_agent: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("no API URL provided and no inline records")]
    NoSource,

    #[error("invalid API URL: {url}")]
    InvalidUrl { url: String },

    #[error("selection target must be greater than zero")]
    InvalidTarget,

    #[error("page size must be greater than zero")]
    InvalidPageSize,

    #[error("id field name is empty")]
    EmptyIdField,

    #[error("page visit order is empty")]
    EmptyPages,

    #[error("page indexes are 1-based, got 0")]
    ZeroPageIndex,

    #[error("failed to build page source: {source}")]
    SourceBuild {
        #[source]
        source: SourceError,
    },

    #[error("page {page} failed: {source}")]
    Fetch {
        page: u64,
        #[source]
        source: SessionError,
    },
}

#[derive(Debug)]
pub struct FillResult {
    pub started_at: Instant,
    pub elapsed: Duration,
    pub pages_visited: Vec<u64>,
    pub selected: Vec<Record>,
    pub pending_quota: Option<u64>,
    pub total_records: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct Runner {
    options: Options,
}

impl Runner {
    pub fn new(options: Options) -> Result<Self, RunnerError> {
        match &options.source {
            RecordSource::Api { url } => {
                if url.trim().is_empty() {
                    return Err(RunnerError::NoSource);
                }
                if reqwest::Url::parse(url).is_err() {
                    return Err(RunnerError::InvalidUrl { url: url.clone() });
                }
            }
            RecordSource::Inline(_) => {}
        }
        if options.select == Some(0) {
            return Err(RunnerError::InvalidTarget);
        }
        if options.page_size == 0 {
            return Err(RunnerError::InvalidPageSize);
        }
        if options.id_field.trim().is_empty() {
            return Err(RunnerError::EmptyIdField);
        }
        if options.start_page == 0 {
            return Err(RunnerError::ZeroPageIndex);
        }
        if let Some(pages) = options.pages.as_ref() {
            if pages.is_empty() {
                return Err(RunnerError::EmptyPages);
            }
            if pages.iter().any(|p| *p == 0) {
                return Err(RunnerError::ZeroPageIndex);
            }
        }
        Ok(Self { options })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub async fn run(&self) -> Result<FillResult, RunnerError> {
        let source: Box<dyn PageSource> = match &self.options.source {
            RecordSource::Api { url } => {
                let source = HttpPageSource::new(HttpSourceOptions {
                    api_url: url.clone(),
                    page_size: self.options.page_size,
                    id_field: self.options.id_field.clone(),
                    fields: self.options.fields.clone(),
                    timeout_seconds: self.options.timeout_seconds,
                    proxy: self.options.proxy.clone(),
                    user_agent: self.options.user_agent.clone(),
                })
                .map_err(|source| RunnerError::SourceBuild { source })?;
                Box::new(source)
            }
            RecordSource::Inline(values) => {
                let source = MemoryPageSource::from_values(
                    values,
                    &self.options.id_field,
                    self.options.page_size,
                )
                .map_err(|source| RunnerError::SourceBuild { source })?;
                Box::new(source)
            }
        };

        let started_at = Instant::now();
        let mut session = Session::new(source, self.options.page_size);
        if let Some(target) = self.options.select {
            session
                .start_auto_fill(target)
                .map_err(|_| RunnerError::InvalidTarget)?;
        }

        let limiter = RateLimiter::direct(Quota::per_second(
            NonZeroU32::new(self.options.rate).unwrap_or(NonZeroU32::MIN),
        ));

        let mut pages_visited = Vec::new();
        for page in self.visit_plan() {
            if self.options.select.is_some() && session.pending_quota().is_none() {
                break;
            }
            if let Some(total_pages) = session.total_pages() {
                if page > total_pages {
                    break;
                }
            }
            limiter.until_ready().await;
            match session.goto_page(page).await {
                Ok(Delivery::Consumed { .. }) => pages_visited.push(page),
                Ok(Delivery::Stale) => {}
                Err(source) => return Err(RunnerError::Fetch { page, source }),
            }
        }

        let elapsed = started_at.elapsed();
        let pending_quota = session.pending_quota();
        let total_records = session.total_records();
        Ok(FillResult {
            started_at,
            elapsed,
            pages_visited,
            selected: session.take_selection(),
            pending_quota,
            total_records,
        })
    }

    fn visit_plan(&self) -> Vec<u64> {
        match self.options.pages.as_ref() {
            Some(pages) => pages.clone(),
            None => (0..self.options.max_pages)
                .map(|i| self.options.start_page.saturating_add(i))
                .collect(),
        }
    }
}
