//! Flattening resolved holds into report rows.

use super::types::{ReportRow, ResolvedHold};

/// Build report rows from resolved holds.
///
/// Rows come back in pull-list order whatever order enrichment finished in.
/// Expired holds are left out.
pub fn aggregate(mut holds: Vec<ResolvedHold>) -> Vec<ReportRow> {
    holds.sort_by_key(|h| h.position);
    holds
        .into_iter()
        .filter(|h| !h.is_expired())
        .map(ReportRow::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holds::HoldType;
    use crate::testing::HoldSpec;

    #[test]
    fn test_restores_pull_list_order() {
        let holds = vec![
            HoldSpec::new("b", HoldType::Copy).resolved(2),
            HoldSpec::new("a", HoldType::Copy).resolved(0),
            HoldSpec::new("c", HoldType::Title).resolved(1),
        ];
        let rows = aggregate(holds);
        let barcodes: Vec<_> = rows.iter().map(|r| r.barcode.as_str()).collect();
        assert_eq!(barcodes, vec!["Ba", "Bc", "Bb"]);
    }

    #[test]
    fn test_expired_holds_are_filtered() {
        let holds = vec![
            HoldSpec::new("1", HoldType::Copy).resolved(0),
            HoldSpec::new("2", HoldType::Copy).status("EXPIRED").resolved(1),
            HoldSpec::new("3", HoldType::Copy).status("BEING_HELD").resolved(2),
        ];
        let rows = aggregate(holds);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.barcode != "B2"));
    }

    #[test]
    fn test_missing_volume_becomes_empty() {
        let rows = aggregate(vec![HoldSpec::new("1", HoldType::Copy).resolved(0)]);
        assert_eq!(rows[0].volume, "");

        let rows = aggregate(vec![HoldSpec::new("1", HoldType::Copy).volume("v.3").resolved(0)]);
        assert_eq!(rows[0].volume, "v.3");
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(Vec::new()).is_empty());
    }
}
