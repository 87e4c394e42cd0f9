use futures::future::BoxFuture;
use serde_json::Value;

use super::{Page, PageSource, Record, SourceError};

// fixed record set sliced into page_size windows; backs inline runs and tests
#[derive(Clone, Debug)]
pub struct MemoryPageSource {
    records: Vec<Record>,
    page_size: usize,
}

impl MemoryPageSource {
    pub fn new(records: Vec<Record>, page_size: usize) -> Self {
        Self { records, page_size }
    }

    pub fn from_values(
        values: &[Value],
        id_field: &str,
        page_size: usize,
    ) -> Result<Self, SourceError> {
        let mut records = Vec::with_capacity(values.len());
        for (index, value) in values.iter().enumerate() {
            let record =
                Record::from_value(value, id_field).ok_or_else(|| SourceError::MissingId {
                    page: (index / page_size.max(1)) as u64 + 1,
                    index: index % page_size.max(1),
                    id_field: id_field.to_string(),
                })?;
            records.push(record);
        }
        Ok(Self::new(records, page_size))
    }

    pub fn total(&self) -> u64 {
        self.records.len() as u64
    }
}

impl PageSource for MemoryPageSource {
    fn fetch_page(&self, page: u64) -> BoxFuture<'_, Result<Page, SourceError>> {
        Box::pin(async move {
            let start = (page.saturating_sub(1) as usize).saturating_mul(self.page_size);
            let end = start.saturating_add(self.page_size).min(self.records.len());
            let records = if start < self.records.len() {
                self.records[start..end].to_vec()
            } else {
                Vec::new()
            };
            Ok(Page {
                index: page,
                page_size: self.page_size,
                records,
                total_records: Some(self.records.len() as u64),
            })
        })
    }
}
