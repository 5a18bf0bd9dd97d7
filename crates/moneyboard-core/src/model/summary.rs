// ── Derived dashboard figures ──
//
// Both cards are placeholders scaled by record count: the shared total
// books $100.00 per record and the liability is half of it.

use super::record::Snapshot;

/// Amount booked per record, in cents.
pub const SHARED_PER_RECORD_CENTS: u64 = 10_000;
/// The viewer's share per record, in cents.
pub const LIABILITY_PER_RECORD_CENTS: u64 = 5_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpenseSummary {
    pub record_count: usize,
    pub total_shared_cents: u64,
    pub liability_cents: u64,
}

impl ExpenseSummary {
    pub fn from_count(record_count: usize) -> Self {
        let count = u64::try_from(record_count).unwrap_or(u64::MAX);
        Self {
            record_count,
            total_shared_cents: count.saturating_mul(SHARED_PER_RECORD_CENTS),
            liability_cents: count.saturating_mul(LIABILITY_PER_RECORD_CENTS),
        }
    }
}

impl From<&Snapshot> for ExpenseSummary {
    fn from(snapshot: &Snapshot) -> Self {
        Self::from_count(snapshot.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_with_record_count() {
        let summary = ExpenseSummary::from_count(3);
        assert_eq!(summary.total_shared_cents, 30_000);
        assert_eq!(summary.liability_cents, 15_000);
    }

    #[test]
    fn empty_snapshot_is_zero() {
        assert_eq!(
            ExpenseSummary::from(&Snapshot::default()),
            ExpenseSummary::default()
        );
    }
}
