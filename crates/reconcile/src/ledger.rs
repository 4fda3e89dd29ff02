use reqgate_protocol::{RequirementRecord, StatusRecord};
use std::collections::HashMap;

/// Committed status per requirement, in document order.
///
/// Owned by the caller: a failed run leaves earlier commits in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusLedger {
    records: Vec<StatusRecord>,
    index: HashMap<String, usize>,
}

impl StatusLedger {
    /// One `Not Started` record per requirement.
    pub fn seed(requirements: &[RequirementRecord]) -> Self {
        let mut ledger = Self::default();
        for req in requirements {
            ledger.upsert(StatusRecord::seed(&req.requirement_id, &req.title));
        }
        ledger
    }

    pub fn get(&self, requirement_id: &str) -> Option<&StatusRecord> {
        self.index.get(requirement_id).map(|&idx| &self.records[idx])
    }

    pub fn contains(&self, requirement_id: &str) -> bool {
        self.index.contains_key(requirement_id)
    }

    /// Replace the record with the same id, or append a new one.
    pub fn upsert(&mut self, record: StatusRecord) {
        match self.index.get(&record.requirement_id) {
            Some(&idx) => self.records[idx] = record,
            None => {
                self.index
                    .insert(record.requirement_id.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }

    /// Commit a whole batch at once.
    pub fn commit(&mut self, staged: Vec<StatusRecord>) -> usize {
        let count = staged.len();
        for record in staged {
            self.upsert(record);
        }
        count
    }

    pub fn records(&self) -> &[StatusRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<StatusRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
