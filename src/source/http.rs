use std::time::Duration;

use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::Value;

use super::{Page, PageSource, Record, SourceError};

#[derive(Clone, Debug)]
pub struct HttpSourceOptions {
    pub api_url: String,
    pub page_size: usize,
    pub id_field: String,
    pub fields: Vec<String>,
    pub timeout_seconds: usize,
    pub proxy: Option<String>,
    pub user_agent: Option<String>,
}

impl Default for HttpSourceOptions {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            page_size: crate::runner::DEFAULT_PAGE_SIZE,
            id_field: "id".to_string(),
            fields: Vec::new(),
            timeout_seconds: 10,
            proxy: None,
            user_agent: None,
        }
    }
}

pub struct HttpPageSource {
    client: reqwest::Client,
    api_url: reqwest::Url,
    page_size: usize,
    id_field: String,
    fields_param: Option<String>,
}

impl HttpPageSource {
    pub fn new(options: HttpSourceOptions) -> Result<Self, SourceError> {
        let api_url =
            reqwest::Url::parse(&options.api_url).map_err(|_| SourceError::InvalidUrl {
                url: options.api_url.clone(),
            })?;

        let mut headers = reqwest::header::HeaderMap::new();
        let user_agent = options
            .user_agent
            .as_deref()
            .filter(|ua| !ua.trim().is_empty())
            .unwrap_or(concat!("pagepick/", env!("CARGO_PKG_VERSION")));
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_str(user_agent)
                .unwrap_or(reqwest::header::HeaderValue::from_static("pagepick")),
        );

        let timeout = Duration::from_secs(options.timeout_seconds.try_into().unwrap_or(10));
        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(timeout);

        if let Some(proxy) = options.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            let proxy = reqwest::Proxy::all(proxy).map_err(|e| SourceError::ProxySetup {
                proxy: proxy.to_string(),
                source: e,
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| SourceError::HttpClientBuild { source: e })?;

        // the API only returns fields it is asked for, so the projection must
        // always carry the id field
        let fields_param = if options.fields.is_empty() {
            None
        } else {
            let mut fields = options.fields.clone();
            if !fields.iter().any(|f| f == &options.id_field) {
                fields.insert(0, options.id_field.clone());
            }
            Some(fields.join(","))
        };

        Ok(Self {
            client,
            api_url,
            page_size: options.page_size,
            id_field: options.id_field,
            fields_param,
        })
    }

    fn page_url(&self, page: u64) -> reqwest::Url {
        let mut url = self.api_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("page", &page.to_string());
            query.append_pair("limit", &self.page_size.to_string());
            if let Some(fields) = self.fields_param.as_deref() {
                query.append_pair("fields", fields);
            }
        }
        url
    }
}

impl PageSource for HttpPageSource {
    fn fetch_page(&self, page: u64) -> BoxFuture<'_, Result<Page, SourceError>> {
        Box::pin(async move {
            let url = self.page_url(page);
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| SourceError::Http { page, source: e })?;

            let status = response.status();
            if !status.is_success() {
                return Err(SourceError::Status {
                    page,
                    status: status.as_u16(),
                });
            }

            let body = response
                .text()
                .await
                .map_err(|e| SourceError::Http { page, source: e })?;
            parse_page_body(&body, page, self.page_size, &self.id_field)
        })
    }
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    pagination: Option<ApiPagination>,
    #[serde(default)]
    data: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ApiPagination {
    total: Option<u64>,
}

pub fn parse_page_body(
    body: &str,
    page: u64,
    page_size: usize,
    id_field: &str,
) -> Result<Page, SourceError> {
    let envelope: ApiEnvelope =
        serde_json::from_str(body).map_err(|e| SourceError::Decode { page, source: e })?;

    let mut records = Vec::with_capacity(envelope.data.len());
    for (index, value) in envelope.data.iter().enumerate() {
        let record = Record::from_value(value, id_field).ok_or_else(|| SourceError::MissingId {
            page,
            index,
            id_field: id_field.to_string(),
        })?;
        records.push(record);
    }

    Ok(Page {
        index: page,
        page_size,
        records,
        total_records: envelope.pagination.and_then(|p| p.total),
    })
}
