//! # Statistics Helpers
//!
//! Pure aggregation queries that turn raw domain numbers into the
//! chart-ready label/value sequences the report elements consume. Insertion
//! order of the output is meaningful and preserved: distribution buckets run
//! low to high, ranked results best first, trend series chronologically.
//!
//! Every bucket partition here uses ONE boundary convention: half-open
//! intervals `[lower, upper)`, with a final catch-all `>= last` bucket. A
//! value sitting exactly on a bound always belongs to the higher bucket.

use std::collections::BTreeMap;

use crate::model::LabeledValue;

/// Which bucket a value falls into for ascending `bounds`. Bucket `i` covers
/// `[bounds[i-1], bounds[i])`; index `bounds.len()` is the `>= last` bucket.
fn bucket_index(value: f64, bounds: &[f64]) -> usize {
    bounds.iter().position(|b| value < *b).unwrap_or(bounds.len())
}

fn bucket_labels(bounds: &[f64]) -> Vec<String> {
    let mut labels = Vec::with_capacity(bounds.len() + 1);
    for (i, upper) in bounds.iter().enumerate() {
        if i == 0 {
            labels.push(format!("< {}", fmt_bound(*upper)));
        } else {
            labels.push(format!("{} - {}", fmt_bound(bounds[i - 1]), fmt_bound(*upper)));
        }
    }
    if let Some(last) = bounds.last() {
        labels.push(format!(">= {}", fmt_bound(*last)));
    }
    labels
}

fn fmt_bound(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

/// How many values fall into each `[lower, upper)` bucket.
///
/// `bounds` must be sorted ascending. Empty bounds collapse to a single
/// "all" bucket; an empty input produces an empty (no-data) result.
pub fn bucket_counts(values: &[f64], bounds: &[f64]) -> Vec<LabeledValue> {
    debug_assert!(bounds.windows(2).all(|w| w[0] < w[1]), "bounds must ascend");
    if values.is_empty() {
        return Vec::new();
    }
    if bounds.is_empty() {
        return vec![LabeledValue::new("all", values.len() as f64)];
    }

    let mut counts = vec![0u64; bounds.len() + 1];
    for v in values {
        counts[bucket_index(*v, bounds)] += 1;
    }
    bucket_labels(bounds)
        .into_iter()
        .zip(counts)
        .map(|(label, n)| LabeledValue::new(label, n as f64))
        .collect()
}

/// The total of the values falling into each `[lower, upper)` bucket —
/// e.g. how much revenue sits in each account-size band.
pub fn bucket_sums(values: &[f64], bounds: &[f64]) -> Vec<LabeledValue> {
    debug_assert!(bounds.windows(2).all(|w| w[0] < w[1]), "bounds must ascend");
    if values.is_empty() {
        return Vec::new();
    }
    if bounds.is_empty() {
        return vec![LabeledValue::new("all", values.iter().sum())];
    }

    let mut sums = vec![0.0f64; bounds.len() + 1];
    for v in values {
        sums[bucket_index(*v, bounds)] += v;
    }
    bucket_labels(bounds)
        .into_iter()
        .zip(sums)
        .map(|(label, s)| LabeledValue::new(label, s))
        .collect()
}

/// Occurrence count per label, first-seen order preserved.
pub fn count_by<I, S>(labels: I) -> Vec<LabeledValue>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<LabeledValue> = Vec::new();
    for label in labels {
        let label = label.as_ref();
        match out.iter_mut().find(|lv| lv.label == label) {
            Some(lv) => lv.value += 1.0,
            None => out.push(LabeledValue::new(label, 1.0)),
        }
    }
    out
}

/// The `n` largest entries, best first. Ties keep their input order.
pub fn top_n(entries: &[LabeledValue], n: usize) -> Vec<LabeledValue> {
    let mut sorted: Vec<LabeledValue> = entries.to_vec();
    sorted.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(std::cmp::Ordering::Equal));
    sorted.truncate(n);
    sorted
}

/// Sum values into "YYYY-MM" month buckets, chronologically ordered.
/// Entries whose label is not a well-formed month bucket are skipped.
pub fn monthly_series(points: &[(String, f64)]) -> Vec<LabeledValue> {
    let mut by_month: BTreeMap<&str, f64> = BTreeMap::new();
    for (label, value) in points {
        if !is_month_bucket(label) {
            log::warn!("skipping malformed month bucket '{}'", label);
            continue;
        }
        *by_month.entry(label.as_str()).or_insert(0.0) += value;
    }
    by_month
        .into_iter()
        .map(|(label, value)| LabeledValue::new(label, value))
        .collect()
}

fn is_month_bucket(label: &str) -> bool {
    let bytes = label.as_bytes();
    if bytes.len() != 7 || bytes[4] != b'-' {
        return false;
    }
    if !bytes[..4].iter().all(u8::is_ascii_digit) || !bytes[5..].iter().all(u8::is_ascii_digit) {
        return false;
    }
    matches!(label[5..7].parse::<u8>(), Ok(1..=12))
}

/// Compact money formatting for text-block bullets: plain under a thousand,
/// "k" under a million, "M" above.
pub fn format_amount(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{:.2} M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.0} k", value / 1_000.0)
    } else {
        format!("{:.2}", value)
    }
}
