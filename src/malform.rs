/// Classification of a recorded, non-fatal deviation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum MalformationKind {
    /// Inconsistent text region line terminators
    LineEnding,

    /// An initial structural assumption was disproved and corrected
    Incorrect,

    /// A tolerated deviation from the otherwise expected shape
    Incompat,
}

/// One recorded non-fatal anomaly
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MalformationRecord {
    /// What kind of anomaly this is
    pub kind: MalformationKind,

    /// The field the anomaly was recorded against
    pub field: String,

    /// Free-form detail, e.g. the observed line terminator
    pub detail: String,
}

/// Transactional, stack-scoped log of non-fatal anomalies
///
/// Used in lockstep with a stream bookmark when recording against a
/// speculative branch: `pop` merges a successful branch's records into its
/// parent, `discard` drops an abandoned branch's records entirely.
///
/// ```
/// use bzn::{MalformationKind, MalformationLedger};
///
/// let mut ledger = MalformationLedger::new();
/// ledger.push();
/// ledger.add(MalformationKind::Incompat, "seq_count", "0");
/// ledger.discard();
/// assert!(ledger.into_records().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct MalformationLedger {
    scopes: Vec<Vec<MalformationRecord>>,
}

impl MalformationLedger {
    /// Creates a ledger with a single root scope
    pub fn new() -> MalformationLedger {
        MalformationLedger {
            scopes: vec![Vec::new()],
        }
    }

    /// Opens a nested recording scope
    pub fn push(&mut self) {
        self.scopes.push(Vec::new());
    }

    /// Merges the current scope's records into its parent
    ///
    /// # Panics
    ///
    /// Panics when only the root scope remains; unmatched pops are a
    /// programming defect.
    pub fn pop(&mut self) {
        assert!(self.scopes.len() > 1, "malformation scope popped with none open");
        let merged = self.scopes.pop().unwrap();
        self.scopes.last_mut().unwrap().extend(merged);
    }

    /// Drops the entire current scope's records
    ///
    /// # Panics
    ///
    /// Panics when only the root scope remains.
    pub fn discard(&mut self) {
        assert!(
            self.scopes.len() > 1,
            "malformation scope discarded with none open"
        );
        self.scopes.pop();
    }

    /// Appends a record to the current scope without aborting decoding
    pub fn add(
        &mut self,
        kind: MalformationKind,
        field: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.scopes.last_mut().unwrap().push(MalformationRecord {
            kind,
            field: field.into(),
            detail: detail.into(),
        });
    }

    /// Number of open nested scopes (zero when only the root is open)
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    /// Consumes the ledger, returning the root scope's records
    ///
    /// # Panics
    ///
    /// Panics when a nested scope is still open.
    pub fn into_records(mut self) -> Vec<MalformationRecord> {
        assert_eq!(self.scopes.len(), 1, "malformation scope left open");
        self.scopes.pop().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_merges_into_parent() {
        let mut ledger = MalformationLedger::new();
        ledger.add(MalformationKind::LineEnding, "line_ending", "LF");
        ledger.push();
        ledger.add(MalformationKind::Incorrect, "missionSave", "true");
        ledger.pop();

        let records = ledger.into_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].field, "missionSave");
    }

    #[test]
    fn test_discard_drops_scope() {
        let mut ledger = MalformationLedger::new();
        ledger.push();
        ledger.push();
        ledger.add(MalformationKind::Incompat, "a", "b");
        ledger.discard();
        ledger.add(MalformationKind::Incompat, "c", "d");
        ledger.pop();

        let records = ledger.into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].field, "c");
    }

    #[test]
    #[should_panic(expected = "malformation scope popped")]
    fn test_root_pop_panics() {
        MalformationLedger::new().pop();
    }
}
