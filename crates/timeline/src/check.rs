//! Whole-collection consistency checks for committed overlays.
//!
//! Unlike the buffered test in [`crate::overlap`], lane exclusivity here is
//! plain half-open interval intersection: two overlays that touch are fine.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::overlay::{Overlay, OverlayId, Row};
use crate::Frame;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum Violation {
    DuplicateId { id: OverlayId },
    InvalidSpan { id: OverlayId, from: Frame, duration: Frame },
    RowOutOfRange { id: OverlayId, row: Row, max_rows: Row },
    LaneOverlap { row: Row, first: OverlayId, second: OverlayId },
}

/// True when two overlays in the same lane share at least one frame.
pub fn spans_intersect(a: &Overlay, b: &Overlay) -> bool {
    a.row == b.row && a.from < b.end() && b.from < a.end()
}

/// Every broken invariant in `overlays`, in input order.
pub fn find_violations(overlays: &[Overlay], max_rows: Row) -> Vec<Violation> {
    let mut out = Vec::new();
    let mut seen = BTreeSet::new();

    for o in overlays {
        if !seen.insert(o.id) {
            out.push(Violation::DuplicateId { id: o.id });
        }
        if o.validate_span().is_err() {
            out.push(Violation::InvalidSpan { id: o.id, from: o.from, duration: o.duration_in_frames });
        }
        if o.row >= max_rows {
            out.push(Violation::RowOutOfRange { id: o.id, row: o.row, max_rows });
        }
    }

    for (i, a) in overlays.iter().enumerate() {
        for b in &overlays[i + 1..] {
            if spans_intersect(a, b) {
                out.push(Violation::LaneOverlap { row: a.row, first: a.id, second: b.id });
            }
        }
    }
    out
}

pub fn lanes_are_exclusive(overlays: &[Overlay]) -> bool {
    overlays
        .iter()
        .enumerate()
        .all(|(i, a)| overlays[i + 1..].iter().all(|b| !spans_intersect(a, b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{OverlayDraft, OverlayKind};

    fn clip(id: OverlayId, from: Frame, duration: Frame, row: Row) -> Overlay {
        OverlayDraft::new(from, duration, row, OverlayKind::Shape { content: "rect".into() }).with_id(id)
    }

    #[test]
    fn touching_spans_are_exclusive() {
        let overlays = vec![clip(1, 0, 50, 0), clip(2, 50, 50, 0), clip(3, 10, 10, 1)];
        assert!(lanes_are_exclusive(&overlays));
        assert!(find_violations(&overlays, 2).is_empty());
    }

    #[test]
    fn reports_each_problem() {
        let overlays = vec![clip(1, 0, 50, 0), clip(2, 49, 10, 0), clip(1, -5, 0, 7)];
        let found = find_violations(&overlays, 5);
        assert_eq!(
            found,
            vec![
                Violation::DuplicateId { id: 1 },
                Violation::InvalidSpan { id: 1, from: -5, duration: 0 },
                Violation::RowOutOfRange { id: 1, row: 7, max_rows: 5 },
                Violation::LaneOverlap { row: 0, first: 1, second: 2 },
            ]
        );
        assert!(!lanes_are_exclusive(&overlays));
    }
}
