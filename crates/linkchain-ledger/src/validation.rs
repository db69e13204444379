use linkchain_crypto::{ChainError, ChainVerifier};

use crate::error::LedgerError;
use crate::traits::{LedgerReader, TipRef};

/// Result of a whole-chain audit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditReport {
    pub length: u64,
    pub tip: TipRef,
    pub violation: Option<ChainError>,
}

impl AuditReport {
    /// Returns `true` if every link, digest and proof checked out.
    pub fn is_valid(&self) -> bool {
        self.violation.is_none()
    }
}

/// Re-verifies a ledger snapshot from genesis to tip.
pub struct ChainAudit;

impl ChainAudit {
    pub fn audit<R: LedgerReader + ?Sized>(reader: &R) -> Result<AuditReport, LedgerError> {
        let entries = reader.entries()?;
        let tip = entries
            .last()
            .map(TipRef::from)
            .ok_or_else(|| LedgerError::IntegrityViolation {
                index: 0,
                reason: "ledger has no genesis entry".into(),
            })?;

        let violation = ChainVerifier::verify_chain(&entries, reader.difficulty()).err();

        Ok(AuditReport {
            length: entries.len() as u64,
            tip,
            violation,
        })
    }
}

#[cfg(test)]
mod tests {
    use linkchain_types::{Difficulty, Digest};

    use super::*;
    use crate::entry::Entry;
    use crate::memory::InMemoryLedger;
    use crate::pow::mine;
    use crate::traits::LedgerWriter;

    #[test]
    fn fresh_ledger_is_valid() {
        let ledger = InMemoryLedger::new(Difficulty::new(3).unwrap());
        let report = ChainAudit::audit(&ledger).unwrap();
        assert!(report.is_valid());
        assert_eq!(report.length, 1);
        assert_eq!(report.tip.index, 0);
    }

    #[test]
    fn committed_entries_pass_audit() {
        let ledger = InMemoryLedger::new(Difficulty::new(1).unwrap());
        for i in 0..3 {
            let tip = ledger.tip().unwrap();
            let entry = mine(
                Entry::draft(tip.index + 1, tip.digest, format!("entry {i}")),
                ledger.difficulty(),
            );
            ledger.try_append(entry).unwrap();
        }

        let report = ChainAudit::audit(&ledger).unwrap();
        assert!(report.is_valid(), "{:?}", report.violation);
        assert_eq!(report.length, 4);
        assert_eq!(report.tip, ledger.tip().unwrap());
    }

    /// Fixed snapshot whose second entry links to the wrong parent.
    struct BrokenSnapshot(Vec<Entry>);

    impl LedgerReader for BrokenSnapshot {
        fn difficulty(&self) -> Difficulty {
            Difficulty::ZERO
        }

        fn tip(&self) -> Result<TipRef, LedgerError> {
            Ok(TipRef::from(&self.0[self.0.len() - 1]))
        }

        fn tip_index(&self) -> u64 {
            self.0.len() as u64 - 1
        }

        fn entry_count(&self) -> Result<u64, LedgerError> {
            Ok(self.0.len() as u64)
        }

        fn get(&self, index: u64) -> Result<Option<Entry>, LedgerError> {
            Ok(self.0.get(index as usize).cloned())
        }

        fn entries(&self) -> Result<Vec<Entry>, LedgerError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn broken_link_is_reported_and_report_clones() {
        let snapshot = BrokenSnapshot(vec![
            Entry::genesis(),
            Entry::draft(1, Digest::from_hash([7; 32]), "orphan"),
        ]);

        let report = ChainAudit::audit(&snapshot).unwrap();
        assert!(!report.is_valid());
        assert_eq!(report.violation, Some(ChainError::BrokenLink { index: 1 }));
        assert_eq!(report.length, 2);

        let copy = report.clone();
        assert_eq!(copy, report);
    }
}
