//! Request merging (C2): partitions possibly-overlapping user sub-requests
//! into a set of non-overlapping ranges whose filters are the union of
//! every input range that covered them, then applies the global
//! `blockRange` clamp.

use ei_types::{BatchRequest, DataRequest, HeightRange};

/// Merges `requests` and clamps the result against `global_range`.
///
/// `# 4.2` calls for "an equivalent list covering identical heights but
/// with no overlapping ranges, whose union of filters is the union of
/// inputs" — a sweep over every range's start/end boundary, splitting the
/// height axis into breakpoint-aligned segments and, for each segment,
/// unioning the `DataRequest`s of every input range that fully covers it.
/// Two inputs sharing the exact same range (the common case) collapse to
/// a single segment equal to that range; genuinely overlapping-but-
/// distinct ranges (e.g. `[0,100]` and `[50,150]`) split at their
/// boundary so no two output ranges overlap. Adjacent segments that end
/// up with identical merged filters are then recombined, so merging a
/// single request — or several requests sharing one range — yields that
/// range unchanged (identity, `# 8` invariant 5).
///
/// `fields` is dropped from every merged `DataRequest` — the
/// processor-wide field selection is applied uniformly afterwards, by the
/// Runner, not per sub-request (see `# 9`, global-fields-wins).
///
/// After merging, every resulting range is clamped against `global_range`:
/// a range wholly outside it is dropped, a partially overlapping one is
/// truncated to the intersection.
pub fn merge_requests(
    requests: &[BatchRequest],
    global_range: Option<HeightRange>,
) -> Vec<BatchRequest> {
    let segments = partition_by_overlap(requests);

    collapse_adjacent(segments)
        .into_iter()
        .filter_map(|(range, request)| {
            clamp_range(range, global_range).map(|clamped| BatchRequest { range: clamped, request })
        })
        .collect()
}

/// Sweeps every input range's boundaries into a sorted, deduplicated set
/// of breakpoints, then for each breakpoint-to-breakpoint segment unions
/// the `DataRequest` of every input range that fully contains it. A
/// segment no input range covers (a gap between two disjoint inputs) is
/// dropped entirely.
fn partition_by_overlap(requests: &[BatchRequest]) -> Vec<(HeightRange, DataRequest)> {
    if requests.is_empty() {
        return Vec::new();
    }

    let mut points: Vec<u64> = Vec::new();
    for req in requests {
        points.push(req.range.from);
        if let Some(to) = req.range.to {
            if let Some(next) = to.checked_add(1) {
                points.push(next);
            }
        }
    }
    points.sort_unstable();
    points.dedup();

    let unbounded = requests.iter().any(|req| req.range.to.is_none());

    let mut segments: Vec<HeightRange> =
        points.windows(2).map(|w| HeightRange { from: w[0], to: Some(w[1] - 1) }).collect();
    if unbounded {
        if let Some(&last) = points.last() {
            segments.push(HeightRange { from: last, to: None });
        }
    }

    segments
        .into_iter()
        .filter_map(|segment| {
            let mut merged: Option<DataRequest> = None;
            for req in requests {
                if range_contains(req.range, segment) {
                    match &mut merged {
                        Some(existing) => merge_data_request(existing, &req.request),
                        None => merged = Some(req.request.clone()),
                    }
                }
            }
            merged.map(|request| (segment, request))
        })
        .collect()
}

/// Whether `range` fully covers `segment` (segment lies entirely within
/// `range`'s bounds). A bounded `range` never contains an unbounded
/// `segment`.
fn range_contains(range: HeightRange, segment: HeightRange) -> bool {
    if segment.from < range.from {
        return false;
    }
    match (range.to, segment.to) {
        (None, _) => true,
        (Some(range_to), Some(segment_to)) => segment_to <= range_to,
        (Some(_), None) => false,
    }
}

/// Recombines directly-adjacent segments whose merged filters ended up
/// identical, so a sweep that happened to land on extra breakpoints (e.g.
/// several inputs sharing one range) still reports one output range
/// rather than spuriously splitting it.
fn collapse_adjacent(segments: Vec<(HeightRange, DataRequest)>) -> Vec<(HeightRange, DataRequest)> {
    let mut collapsed: Vec<(HeightRange, DataRequest)> = Vec::with_capacity(segments.len());
    for (range, request) in segments {
        let merges_with_previous = collapsed
            .last()
            .is_some_and(|(prev_range, prev_request)| {
                prev_request == &request && prev_range.to.and_then(|to| to.checked_add(1)) == Some(range.from)
            });
        if merges_with_previous {
            collapsed.last_mut().unwrap().0.to = range.to;
        } else {
            collapsed.push((range, request));
        }
    }
    collapsed
}

fn merge_data_request(into: &mut DataRequest, from: &DataRequest) {
    into.logs.extend(from.logs.iter().cloned());
    into.transactions.extend(from.transactions.iter().cloned());
    into.include_all_blocks = into.include_all_blocks || from.include_all_blocks;
    into.fields = None;
}

/// Intersects `range` with `global_range`. Returns `None` when the
/// intersection is empty, i.e. the sub-request falls wholly outside the
/// processor-wide clamp.
fn clamp_range(range: HeightRange, global_range: Option<HeightRange>) -> Option<HeightRange> {
    let Some(global_range) = global_range else { return Some(range) };

    let from = range.from.max(global_range.from);
    let to = match (range.to, global_range.to) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    };
    let clamped = HeightRange { from, to };
    if clamped.is_empty() {
        None
    } else {
        Some(clamped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ei_types::{LogCriterion, TxCriterion};

    fn req(from: u64, to: Option<u64>, logs: Vec<LogCriterion>, txs: Vec<TxCriterion>) -> BatchRequest {
        BatchRequest {
            range: HeightRange { from, to },
            request: DataRequest { include_all_blocks: false, logs, transactions: txs, fields: None },
        }
    }

    #[test]
    fn merging_a_single_request_is_identity() {
        let single = req(10, Some(20), vec![LogCriterion::default()], vec![]);
        let merged = merge_requests(&[single.clone()], None);
        assert_eq!(merged, vec![single]);
    }

    #[test]
    fn overlapping_same_range_requests_union_their_filters() {
        let a = req(10, Some(20), vec![LogCriterion::default()], vec![]);
        let b = req(10, Some(20), vec![], vec![TxCriterion::default()]);
        let merged = merge_requests(&[a, b], None);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].request.logs.len(), 1);
        assert_eq!(merged[0].request.transactions.len(), 1);
    }

    #[test]
    fn merge_is_commutative_up_to_list_order() {
        let a = req(10, Some(20), vec![LogCriterion::default()], vec![]);
        let b = req(10, Some(20), vec![], vec![TxCriterion::default()]);

        let forward = merge_requests(&[a.clone(), b.clone()], None);
        let backward = merge_requests(&[b, a], None);

        assert_eq!(forward.len(), backward.len());
        assert_eq!(forward[0].request.logs.len(), backward[0].request.logs.len());
        assert_eq!(
            forward[0].request.transactions.len(),
            backward[0].request.transactions.len()
        );
    }

    #[test]
    fn distinct_ranges_stay_separate() {
        let a = req(0, Some(10), vec![], vec![]);
        let b = req(20, Some(30), vec![], vec![]);
        let merged = merge_requests(&[a, b], None);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn genuinely_overlapping_ranges_split_at_their_boundary() {
        let a = req(0, Some(100), vec![LogCriterion::default()], vec![]);
        let b = req(50, Some(150), vec![], vec![TxCriterion::default()]);
        let merged = merge_requests(&[a, b], None);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].range, HeightRange { from: 0, to: Some(49) });
        assert_eq!(merged[0].request.logs.len(), 1);
        assert_eq!(merged[0].request.transactions.len(), 0);

        assert_eq!(merged[1].range, HeightRange { from: 50, to: Some(100) });
        assert_eq!(merged[1].request.logs.len(), 1);
        assert_eq!(merged[1].request.transactions.len(), 1);

        assert_eq!(merged[2].range, HeightRange { from: 101, to: Some(150) });
        assert_eq!(merged[2].request.logs.len(), 0);
        assert_eq!(merged[2].request.transactions.len(), 1);
    }

    #[test]
    fn an_unbounded_range_overlapping_a_bounded_one_splits_into_a_trailing_unbounded_segment() {
        let a = req(0, Some(50), vec![LogCriterion::default()], vec![]);
        let b = req(25, None, vec![], vec![TxCriterion::default()]);
        let merged = merge_requests(&[a, b], None);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].range, HeightRange { from: 0, to: Some(24) });
        assert_eq!(merged[1].range, HeightRange { from: 25, to: Some(50) });
        assert_eq!(merged[2].range, HeightRange { from: 51, to: None });
        assert_eq!(merged[2].request.transactions.len(), 1);
    }

    #[test]
    fn three_ranges_sharing_a_common_window_all_contribute_to_it() {
        let a = req(0, Some(30), vec![LogCriterion::default()], vec![]);
        let b = req(10, Some(40), vec![], vec![TxCriterion::default()]);
        let c = req(20, Some(50), vec![LogCriterion::default()], vec![]);
        let merged = merge_requests(&[a, b, c], None);

        let overlap = merged.iter().find(|r| r.range == HeightRange { from: 20, to: Some(30) }).unwrap();
        assert_eq!(overlap.request.logs.len(), 2);
        assert_eq!(overlap.request.transactions.len(), 1);
    }

    #[test]
    fn empty_input_yields_no_requests() {
        assert!(merge_requests(&[], None).is_empty());
    }

    #[test]
    fn global_clamp_truncates_partial_overlap() {
        let a = req(0, Some(100), vec![], vec![]);
        let merged = merge_requests(&[a], Some(HeightRange { from: 10, to: Some(50) }));
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].range, HeightRange { from: 10, to: Some(50) });
    }

    #[test]
    fn global_clamp_rejects_requests_wholly_outside() {
        let a = req(0, Some(10), vec![], vec![]);
        let merged = merge_requests(&[a], Some(HeightRange { from: 100, to: None }));
        assert!(merged.is_empty());
    }

    #[test]
    fn open_ended_range_clamped_by_closed_global_inherits_its_upper_bound() {
        let a = req(0, None, vec![], vec![]);
        let merged = merge_requests(&[a], Some(HeightRange { from: 0, to: Some(50) }));
        assert_eq!(merged[0].range.to, Some(50));
    }
}
