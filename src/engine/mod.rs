use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::source::{Page, Record, RecordId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("selection target must be greater than zero")]
    InvalidTarget,
}

// Idle while pending_quota is None, AutoFilling while it holds a positive
// remainder. Manual toggles are legal in both states.
#[derive(Debug, Default)]
pub struct SelectionEngine {
    selected: HashMap<RecordId, Record>,
    order: Vec<RecordId>,
    pending_quota: Option<u64>,
    drawn_pages: HashSet<u64>,
}

impl SelectionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // arms the fill; nothing is selected until a page is consumed
    pub fn start_auto_fill(&mut self, target: u64) -> Result<(), EngineError> {
        if target == 0 {
            return Err(EngineError::InvalidTarget);
        }
        self.clear_selection();
        self.drawn_pages.clear();
        self.pending_quota = Some(target);
        Ok(())
    }

    // draws the first min(quota, |page|) records of a page, once per page
    // index per fill; returns the count taken
    pub fn consume_page(&mut self, page: &Page) -> usize {
        let quota = match self.pending_quota {
            Some(quota) => quota,
            None => return 0,
        };
        if page.records.is_empty() {
            // not marked drawn: a later refetch of this index may have data
            return 0;
        }
        if !self.drawn_pages.insert(page.index) {
            return 0;
        }

        let take = quota.min(page.records.len() as u64) as usize;
        for record in page.records.iter().take(take) {
            self.insert(record.clone());
        }

        let remaining = quota - take as u64;
        self.pending_quota = if remaining > 0 { Some(remaining) } else { None };
        take
    }

    // membership flip by id; returns the new membership state
    pub fn toggle_row(&mut self, record: &Record) -> bool {
        if self.selected.contains_key(&record.id) {
            self.remove(&record.id);
            false
        } else {
            self.insert(record.clone());
            true
        }
    }

    pub fn set_selection(&mut self, records: Vec<Record>) {
        self.clear_selection();
        for record in records {
            self.insert(record);
        }
    }

    pub fn reset(&mut self) {
        self.clear_selection();
        self.drawn_pages.clear();
        self.pending_quota = None;
    }

    pub fn pending_quota(&self) -> Option<u64> {
        self.pending_quota
    }

    pub fn is_auto_filling(&self) -> bool {
        self.pending_quota.is_some()
    }

    pub fn is_selected(&self, id: &RecordId) -> bool {
        self.selected.contains_key(id)
    }

    pub fn selected_len(&self) -> usize {
        self.selected.len()
    }

    pub fn selection(&self) -> Vec<&Record> {
        self.order
            .iter()
            .filter_map(|id| self.selected.get(id))
            .collect()
    }

    pub fn take_selection(&mut self) -> Vec<Record> {
        let order = std::mem::take(&mut self.order);
        order
            .into_iter()
            .filter_map(|id| self.selected.remove(&id))
            .collect()
    }

    fn insert(&mut self, record: Record) {
        let id = record.id.clone();
        if self.selected.insert(id.clone(), record).is_none() {
            self.order.push(id);
        }
    }

    fn remove(&mut self, id: &RecordId) {
        if self.selected.remove(id).is_some() {
            self.order.retain(|o| o != id);
        }
    }

    fn clear_selection(&mut self) {
        self.selected.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Map;

    use super::{EngineError, SelectionEngine};
    use crate::source::{Page, Record, RecordId};

    fn record(id: u64) -> Record {
        Record {
            id: RecordId::new(id.to_string()),
            fields: Map::new(),
        }
    }

    fn page(index: u64, ids: std::ops::RangeInclusive<u64>) -> Page {
        Page {
            index,
            page_size: 12,
            records: ids.map(record).collect(),
            total_records: None,
        }
    }

    fn ids(engine: &SelectionEngine) -> Vec<String> {
        engine
            .selection()
            .iter()
            .map(|r| r.id.as_str().to_string())
            .collect()
    }

    #[test]
    fn target_within_one_page_fills_from_the_front() {
        // scenario A: page size 12, target 5
        let mut engine = SelectionEngine::new();
        engine.start_auto_fill(5).unwrap();
        let drawn = engine.consume_page(&page(1, 1..=12));
        assert_eq!(drawn, 5);
        assert_eq!(ids(&engine), vec!["1", "2", "3", "4", "5"]);
        assert_eq!(engine.pending_quota(), None);
    }

    #[test]
    fn quota_carries_forward_across_pages() {
        // scenario B: target 15 across two pages of 12
        let mut engine = SelectionEngine::new();
        engine.start_auto_fill(15).unwrap();

        assert_eq!(engine.consume_page(&page(1, 1..=12)), 12);
        assert_eq!(engine.selected_len(), 12);
        assert_eq!(engine.pending_quota(), Some(3));

        assert_eq!(engine.consume_page(&page(2, 13..=24)), 3);
        assert_eq!(engine.selected_len(), 15);
        assert!(engine.is_selected(&RecordId::new("15")));
        assert!(!engine.is_selected(&RecordId::new("16")));
        assert_eq!(engine.pending_quota(), None);
    }

    #[test]
    fn restarting_discards_the_previous_target_entirely() {
        // scenario C
        let mut engine = SelectionEngine::new();
        engine.start_auto_fill(5).unwrap();
        engine.start_auto_fill(3).unwrap();
        assert_eq!(engine.pending_quota(), Some(3));

        assert_eq!(engine.consume_page(&page(1, 1..=12)), 3);
        assert_eq!(ids(&engine), vec!["1", "2", "3"]);
        assert_eq!(engine.pending_quota(), None);
    }

    #[test]
    fn consume_page_is_idempotent_per_page() {
        let mut engine = SelectionEngine::new();
        engine.start_auto_fill(15).unwrap();
        assert_eq!(engine.consume_page(&page(1, 1..=12)), 12);
        // refetch of the same page must neither re-add nor double-decrement
        assert_eq!(engine.consume_page(&page(1, 1..=12)), 0);
        assert_eq!(engine.selected_len(), 12);
        assert_eq!(engine.pending_quota(), Some(3));
    }

    #[test]
    fn manual_deselection_on_a_drawn_page_is_never_overwritten() {
        // scenario D
        let mut engine = SelectionEngine::new();
        engine.start_auto_fill(15).unwrap();
        engine.consume_page(&page(1, 1..=12));

        assert!(!engine.toggle_row(&record(4)));
        assert_eq!(engine.selected_len(), 11);
        assert_eq!(engine.pending_quota(), Some(3));

        engine.consume_page(&page(1, 1..=12));
        assert!(!engine.is_selected(&RecordId::new("4")));
        assert_eq!(engine.selected_len(), 11);
        assert_eq!(engine.pending_quota(), Some(3));

        assert_eq!(engine.consume_page(&page(2, 13..=24)), 3);
        assert_eq!(engine.selected_len(), 14);
    }

    #[test]
    fn toggle_is_an_involution_on_membership() {
        let mut engine = SelectionEngine::new();
        assert!(engine.toggle_row(&record(7)));
        assert!(engine.is_selected(&RecordId::new("7")));
        assert!(!engine.toggle_row(&record(7)));
        assert!(!engine.is_selected(&RecordId::new("7")));
        assert_eq!(engine.selected_len(), 0);
    }

    #[test]
    fn membership_is_keyed_on_id_not_the_record_object() {
        let mut engine = SelectionEngine::new();
        engine.toggle_row(&record(9));
        // a refetched copy of the same row carries different field data
        let mut refetched = record(9);
        refetched
            .fields
            .insert("title".to_string(), serde_json::json!("now loaded"));
        assert!(engine.is_selected(&refetched.id));
        assert!(!engine.toggle_row(&refetched));
        assert_eq!(engine.selected_len(), 0);
    }

    #[test]
    fn start_auto_fill_clears_any_prior_selection() {
        let mut engine = SelectionEngine::new();
        engine.toggle_row(&record(1));
        engine.toggle_row(&record(2));
        engine.start_auto_fill(3).unwrap();
        assert_eq!(engine.selected_len(), 0);
        assert_eq!(engine.pending_quota(), Some(3));
    }

    #[test]
    fn zero_target_is_rejected_without_state_change() {
        let mut engine = SelectionEngine::new();
        engine.toggle_row(&record(1));
        assert_eq!(engine.start_auto_fill(0), Err(EngineError::InvalidTarget));
        assert_eq!(engine.selected_len(), 1);
        assert_eq!(engine.pending_quota(), None);
    }

    #[test]
    fn consume_without_a_quota_is_a_noop() {
        let mut engine = SelectionEngine::new();
        assert_eq!(engine.consume_page(&page(1, 1..=12)), 0);
        assert_eq!(engine.selected_len(), 0);
    }

    #[test]
    fn empty_page_is_a_noop_and_not_marked_drawn() {
        let mut engine = SelectionEngine::new();
        engine.start_auto_fill(5).unwrap();
        let empty = Page {
            index: 2,
            page_size: 12,
            records: Vec::new(),
            total_records: None,
        };
        assert_eq!(engine.consume_page(&empty), 0);
        assert_eq!(engine.pending_quota(), Some(5));
        // once the page actually has data it still satisfies the quota
        assert_eq!(engine.consume_page(&page(2, 13..=24)), 5);
        assert_eq!(engine.pending_quota(), None);
    }

    #[test]
    fn fill_stops_at_the_record_population() {
        let mut engine = SelectionEngine::new();
        engine.start_auto_fill(20).unwrap();
        engine.consume_page(&page(1, 1..=12));
        let short = Page {
            index: 2,
            page_size: 12,
            records: (13..=18).map(record).collect(),
            total_records: Some(18),
        };
        engine.consume_page(&short);
        // |selected| == min(target, total)
        assert_eq!(engine.selected_len(), 18);
        assert_eq!(engine.pending_quota(), Some(2));
    }

    #[test]
    fn set_selection_replaces_wholesale_and_keeps_the_quota() {
        let mut engine = SelectionEngine::new();
        engine.start_auto_fill(15).unwrap();
        engine.consume_page(&page(1, 1..=12));
        engine.set_selection(vec![record(30), record(31)]);
        assert_eq!(ids(&engine), vec!["30", "31"]);
        assert_eq!(engine.pending_quota(), Some(3));
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut engine = SelectionEngine::new();
        engine.start_auto_fill(15).unwrap();
        engine.consume_page(&page(1, 1..=12));
        engine.reset();
        assert_eq!(engine.selected_len(), 0);
        assert_eq!(engine.pending_quota(), None);
        assert!(!engine.is_auto_filling());
    }

    #[test]
    fn auto_fill_takes_a_prefix_in_sequence_order() {
        let mut engine = SelectionEngine::new();
        engine.start_auto_fill(3).unwrap();
        let shuffled = Page {
            index: 1,
            page_size: 12,
            records: [40, 2, 17, 5, 9].iter().map(|i| record(*i)).collect(),
            total_records: None,
        };
        engine.consume_page(&shuffled);
        assert_eq!(ids(&engine), vec!["40", "2", "17"]);
    }

    #[test]
    fn take_selection_drains_in_insertion_order() {
        let mut engine = SelectionEngine::new();
        engine.toggle_row(&record(3));
        engine.toggle_row(&record(1));
        engine.toggle_row(&record(2));
        let drained: Vec<_> = engine
            .take_selection()
            .into_iter()
            .map(|r| r.id.as_str().to_string())
            .collect();
        assert_eq!(drained, vec!["3", "1", "2"]);
        assert_eq!(engine.selected_len(), 0);
    }
}
