use thiserror::Error;

use crate::engine::{EngineError, SelectionEngine};
use crate::source::{Page, PageSource, Record, RecordId, SourceError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("page fetch failed: {source}")]
    Fetch {
        #[source]
        source: SourceError,
    },

    #[error("source returned page {got}, expected page {requested}")]
    PageMismatch { requested: u64, got: u64 },
}

// binds a fetch to the request sequence it was issued under; a delivery whose
// ticket no longer matches the sequence is stale and gets discarded
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    page: u64,
}

impl FetchTicket {
    pub fn page(&self) -> u64 {
        self.page
    }
}

#[derive(Debug)]
pub enum Delivery {
    Consumed { page: Page, drawn: usize },
    Stale,
}

pub struct Session<S> {
    source: S,
    engine: SelectionEngine,
    page_size: usize,
    current_page: u64,
    total_records: Option<u64>,
    request_seq: u64,
}

impl<S: PageSource> Session<S> {
    pub fn new(source: S, page_size: usize) -> Self {
        Self {
            source,
            engine: SelectionEngine::new(),
            page_size,
            current_page: 1,
            total_records: None,
            request_seq: 0,
        }
    }

    pub fn begin_goto(&mut self, page: u64) -> FetchTicket {
        self.request_seq += 1;
        FetchTicket {
            seq: self.request_seq,
            page,
        }
    }

    pub fn deliver(
        &mut self,
        ticket: FetchTicket,
        fetched: Result<Page, SourceError>,
    ) -> Result<Delivery, SessionError> {
        if ticket.seq != self.request_seq {
            // a newer navigation, fill, or reset superseded this fetch
            return Ok(Delivery::Stale);
        }
        let page = fetched.map_err(|source| SessionError::Fetch { source })?;
        if page.index != ticket.page {
            return Err(SessionError::PageMismatch {
                requested: ticket.page,
                got: page.index,
            });
        }

        self.current_page = page.index;
        if page.total_records.is_some() {
            self.total_records = page.total_records;
        }
        let drawn = self.engine.consume_page(&page);
        Ok(Delivery::Consumed { page, drawn })
    }

    pub async fn goto_page(&mut self, page: u64) -> Result<Delivery, SessionError> {
        let ticket = self.begin_goto(page);
        let fetched = self.source.fetch_page(page).await;
        self.deliver(ticket, fetched)
    }

    pub fn start_auto_fill(&mut self, target: u64) -> Result<(), EngineError> {
        self.engine.start_auto_fill(target)?;
        self.request_seq += 1;
        Ok(())
    }

    pub fn toggle_row(&mut self, record: &Record) -> bool {
        self.engine.toggle_row(record)
    }

    pub fn set_selection(&mut self, records: Vec<Record>) {
        self.engine.set_selection(records);
    }

    pub fn reset(&mut self) {
        self.engine.reset();
        self.request_seq += 1;
    }

    pub fn engine(&self) -> &SelectionEngine {
        &self.engine
    }

    pub fn is_selected(&self, id: &RecordId) -> bool {
        self.engine.is_selected(id)
    }

    pub fn pending_quota(&self) -> Option<u64> {
        self.engine.pending_quota()
    }

    pub fn take_selection(&mut self) -> Vec<Record> {
        self.engine.take_selection()
    }

    pub fn current_page(&self) -> u64 {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_records(&self) -> Option<u64> {
        self.total_records
    }

    pub fn total_pages(&self) -> Option<u64> {
        let total = self.total_records?;
        let size = self.page_size as u64;
        if size == 0 {
            return None;
        }
        Some(total.div_ceil(size))
    }
}
