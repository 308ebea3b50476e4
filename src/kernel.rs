//! Generic aggregation primitives shared by every engine
//!
//! Reified window-function semantics (rank, quantile buckets, lag, moving
//! average) with explicit tie-break and edge-case rules. All functions are
//! pure, know nothing about business semantics, and return empty output for
//! empty input. Every ordering takes a secondary `Ord` tie-break key so a run
//! over the same records is reproducible regardless of input order.

use std::collections::HashMap;
use std::hash::Hash;

/// Sort direction for quantile bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Group records by key and sum their values.
///
/// Absent values contribute nothing to a sum; a key appears in the output only
/// if at least one of its records carries a present value.
pub fn group_sum<T, K, KF, VF>(records: &[T], key_fn: KF, value_fn: VF) -> HashMap<K, f64>
where
    K: Eq + Hash,
    KF: Fn(&T) -> K,
    VF: Fn(&T) -> Option<f64>,
{
    let mut sums = HashMap::new();
    for record in records {
        if let Some(value) = value_fn(record) {
            *sums.entry(key_fn(record)).or_insert(0.0) += value;
        }
    }
    sums
}

/// Group records by key and average their present values.
///
/// Unlike sums, absent values are excluded entirely: they neither count toward
/// the denominator nor establish the key.
pub fn group_avg<T, K, KF, VF>(records: &[T], key_fn: KF, value_fn: VF) -> HashMap<K, f64>
where
    K: Eq + Hash,
    KF: Fn(&T) -> K,
    VF: Fn(&T) -> Option<f64>,
{
    let mut acc: HashMap<K, (f64, usize)> = HashMap::new();
    for record in records {
        if let Some(value) = value_fn(record) {
            let entry = acc.entry(key_fn(record)).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }
    acc.into_iter()
        .map(|(k, (sum, count))| (k, sum / count as f64))
        .collect()
}

/// Pair each record with the cumulative sum of values, largest first.
///
/// Stable descending sort by value, ties broken ascending by `tie_fn`, so the
/// walk order (and therefore any prefix cut) is deterministic.
pub fn running_sum<'a, T, K, VF, TF>(records: &'a [T], value_fn: VF, tie_fn: TF) -> Vec<(&'a T, f64)>
where
    K: Ord,
    VF: Fn(&T) -> f64,
    TF: Fn(&T) -> K,
{
    let sorted = sort_refs(records, &value_fn, &tie_fn, SortDirection::Descending);
    let mut cumulative = 0.0;
    sorted
        .into_iter()
        .map(|record| {
            cumulative += value_fn(record);
            (record, cumulative)
        })
        .collect()
}

/// 1-indexed competition rank over values, largest first.
///
/// Records with equal values share a rank; the next distinct value resumes at
/// its row position (1, 2, 2, 4), matching the ordered-row-number contract
/// rather than dense-rank collapse.
pub fn rank<'a, T, K, VF, TF>(records: &'a [T], value_fn: VF, tie_fn: TF) -> Vec<(&'a T, usize)>
where
    K: Ord,
    VF: Fn(&T) -> f64,
    TF: Fn(&T) -> K,
{
    let sorted = sort_refs(records, &value_fn, &tie_fn, SortDirection::Descending);
    let mut out = Vec::with_capacity(sorted.len());
    let mut current_rank = 0;
    let mut prev_value: Option<f64> = None;
    for (position, record) in sorted.into_iter().enumerate() {
        let value = value_fn(record);
        if prev_value != Some(value) {
            current_rank = position + 1;
            prev_value = Some(value);
        }
        out.push((record, current_rank));
    }
    out
}

/// Partition sorted records into `buckets` near-equal groups, 1-indexed.
///
/// Bucket sizes differ by at most one; the remainder goes to the first
/// buckets. Zero buckets yields no assignments (rejected upstream at
/// configuration time), as does empty input.
pub fn quantile_bucket<'a, T, K, VF, TF>(
    records: &'a [T],
    value_fn: VF,
    tie_fn: TF,
    direction: SortDirection,
    buckets: usize,
) -> Vec<(&'a T, usize)>
where
    K: Ord,
    VF: Fn(&T) -> f64,
    TF: Fn(&T) -> K,
{
    if buckets == 0 || records.is_empty() {
        return Vec::new();
    }
    let sorted = sort_refs(records, &value_fn, &tie_fn, direction);
    let n = sorted.len();
    let base = n / buckets;
    let remainder = n % buckets;

    let mut out = Vec::with_capacity(n);
    let mut index = 0;
    for bucket in 1..=buckets {
        let size = base + usize::from(bucket <= remainder);
        for record in &sorted[index..index + size] {
            out.push((*record, bucket));
        }
        index += size;
    }
    out
}

/// Pair each record, in ascending key order, with the previous record's value.
///
/// The first element has no predecessor.
pub fn lag<'a, T, K, KF, VF>(records: &'a [T], key_fn: KF, value_fn: VF) -> Vec<(&'a T, Option<f64>)>
where
    K: Ord,
    KF: Fn(&T) -> K,
    VF: Fn(&T) -> f64,
{
    let mut sorted: Vec<&T> = records.iter().collect();
    sorted.sort_by(|a, b| key_fn(a).cmp(&key_fn(b)));

    let mut out = Vec::with_capacity(sorted.len());
    let mut prev: Option<f64> = None;
    for record in sorted {
        out.push((record, prev));
        prev = Some(value_fn(record));
    }
    out
}

/// Trailing moving average over an already ordered sequence.
///
/// The window includes the current element and uses fewer elements at the
/// start. A zero window yields no output.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 {
        return Vec::new();
    }
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &values[start..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

fn sort_refs<'a, T, K, VF, TF>(
    records: &'a [T],
    value_fn: &VF,
    tie_fn: &TF,
    direction: SortDirection,
) -> Vec<&'a T>
where
    K: Ord,
    VF: Fn(&T) -> f64,
    TF: Fn(&T) -> K,
{
    let mut sorted: Vec<&T> = records.iter().collect();
    sorted.sort_by(|a, b| {
        let (va, vb) = (value_fn(a), value_fn(b));
        let by_value = match direction {
            SortDirection::Ascending => va.total_cmp(&vb),
            SortDirection::Descending => vb.total_cmp(&va),
        };
        by_value.then_with(|| tie_fn(a).cmp(&tie_fn(b)))
    });
    sorted
}
