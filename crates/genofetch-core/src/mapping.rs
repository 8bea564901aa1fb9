//! Piecewise-linear coordinate mapping
//!
//! A [`CoordinateMap`] relates an ordered list of "from" ranges to an ordered
//! list of "to" ranges. Ranges are 1-based and inclusive, and are stored in
//! traversal order: a reverse-strand range is written `(end, begin)` and a
//! reverse-strand list descends. Gaps between ranges (introns) are unmapped.
//!
//! `from_ratio` source units correspond to `to_ratio` destination units, so a
//! CDS to protein map is 3:1 and everything else in this crate is 1:1.
//!
//! ```
//! use genofetch_core::mapping::CoordinateMap;
//!
//! // two exons spliced into a 6 base transcript
//! let map = CoordinateMap::new(vec![(4, 6), (10, 12)], vec![(1, 6)], 1, 1).unwrap();
//! assert_eq!(map.locate(10), Some((4, 4)));
//! assert_eq!(map.locate(8), None);
//! assert_eq!(map.locate_range(3, 4), Some(vec![(1, 1)]));
//! ```

use crate::error::{EnsemblError, Result};
use serde::{Deserialize, Serialize};

/// Inclusive range in traversal order; `start > end` on the reverse strand
pub type Span = (i64, i64);

/// Number of positions covered by a span regardless of direction
pub fn span_len(span: Span) -> i64 {
    (span.1 - span.0).abs() + 1
}

/// Total positions covered by a list of spans
pub fn total_len(spans: &[Span]) -> i64 {
    spans.iter().map(|&s| span_len(s)).sum()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoordinateMap {
    from_ranges: Vec<Span>,
    to_ranges: Vec<Span>,
    from_ratio: u32,
    to_ratio: u32,
}

impl CoordinateMap {
    /// Build a map, rejecting range lists whose mapped unit counts differ
    ///
    /// Contiguous ranges running in the same direction are merged, so
    /// `[(1, 3), (4, 6)]` is stored as `[(1, 6)]`.
    pub fn new(from: Vec<Span>, to: Vec<Span>, from_ratio: u32, to_ratio: u32) -> Result<Self> {
        if from_ratio == 0 || to_ratio == 0 {
            return Err(EnsemblError::invalid_mapping(format!(
                "ratios must be positive, got {}:{}",
                from_ratio, to_ratio
            )));
        }
        if from.is_empty() || to.is_empty() {
            return Err(EnsemblError::invalid_mapping("range lists must not be empty"));
        }

        let from_units = total_len(&from) / i64::from(from_ratio);
        let to_units = total_len(&to) / i64::from(to_ratio);
        if from_units != to_units {
            return Err(EnsemblError::invalid_mapping(format!(
                "{:?} maps {} units but {:?} maps {} at {}:{}",
                from, from_units, to, to_units, from_ratio, to_ratio
            )));
        }

        Ok(Self {
            from_ranges: coalesce(&from),
            to_ranges: coalesce(&to),
            from_ratio,
            to_ratio,
        })
    }

    /// One contiguous range onto another at 1:1
    pub fn contiguous(from: Span, to: Span) -> Result<Self> {
        Self::new(vec![from], vec![to], 1, 1)
    }

    pub fn from_ranges(&self) -> &[Span] {
        &self.from_ranges
    }

    pub fn to_ranges(&self) -> &[Span] {
        &self.to_ranges
    }

    pub fn from_ratio(&self) -> u32 {
        self.from_ratio
    }

    pub fn to_ratio(&self) -> u32 {
        self.to_ratio
    }

    pub fn from_length(&self) -> i64 {
        total_len(&self.from_ranges)
    }

    pub fn to_length(&self) -> i64 {
        total_len(&self.to_ranges)
    }

    /// Units mapped on either side (codons for a 3:1 map)
    pub fn mapped_units(&self) -> i64 {
        self.from_length() / i64::from(self.from_ratio)
    }

    pub fn from_lowest(&self) -> i64 {
        lowest(&self.from_ranges)
    }

    pub fn from_highest(&self) -> i64 {
        highest(&self.from_ranges)
    }

    pub fn to_lowest(&self) -> i64 {
        lowest(&self.to_ranges)
    }

    pub fn to_highest(&self) -> i64 {
        highest(&self.to_ranges)
    }

    /// Whether the from side ascends overall
    pub fn is_forward(&self) -> bool {
        net_direction(&self.from_ranges) >= 0
    }

    pub fn is_to_forward(&self) -> bool {
        net_direction(&self.to_ranges) >= 0
    }

    /// Map one from-position to the to-position(s) it corresponds to
    ///
    /// For a 1:3 map the result spans the codon; for 3:1 and 1:1 it is a single
    /// position. Returns `None` for positions in a gap or beyond the mapped
    /// region, including an incomplete trailing codon.
    pub fn locate(&self, pos: i64) -> Option<Span> {
        let offset = offset_of(&self.from_ranges, pos)?;
        let unit = offset / i64::from(self.from_ratio);
        let first = unit * i64::from(self.to_ratio);
        let last = first + i64::from(self.to_ratio) - 1;
        Some((
            position_at(&self.to_ranges, first)?,
            position_at(&self.to_ranges, last)?,
        ))
    }

    /// Map a from-range to the to-ranges covering its mapped portion
    ///
    /// Parts of the range in gaps or outside the map are clipped away. The
    /// result follows the to side's traversal order and is `None` only when
    /// nothing overlaps.
    pub fn locate_range(&self, begin: i64, end: i64) -> Option<Vec<Span>> {
        map_positions(
            begin,
            end,
            &self.from_ranges,
            &self.to_ranges,
            self.from_ratio,
            self.to_ratio,
        )
    }

    /// The reverse of [`locate_range`](Self::locate_range)
    pub fn locate_in_from(&self, begin: i64, end: i64) -> Option<Vec<Span>> {
        map_positions(
            begin,
            end,
            &self.to_ranges,
            &self.from_ranges,
            self.to_ratio,
            self.from_ratio,
        )
    }

    /// Swap the two sides
    pub fn invert(&self) -> CoordinateMap {
        CoordinateMap {
            from_ranges: self.to_ranges.clone(),
            to_ranges: self.from_ranges.clone(),
            from_ratio: self.to_ratio,
            to_ratio: self.from_ratio,
        }
    }

    /// Chain `self: A -> B` with `other: B -> C` into `A -> C`
    ///
    /// Every to-range of `self` must be wholly covered by `other`.
    pub fn compose(&self, other: &CoordinateMap) -> Result<CoordinateMap> {
        let mut to = Vec::with_capacity(self.to_ranges.len());

        for &range in &self.to_ranges {
            let pieces = other.locate_range(range.0, range.1).ok_or_else(|| {
                EnsemblError::unmappable(format!("{:?} has no image in {}", range, other))
            })?;

            let covered = total_len(&pieces);
            if span_len(range) * i64::from(other.to_ratio)
                != covered * i64::from(other.from_ratio)
            {
                return Err(EnsemblError::unmappable(format!(
                    "{:?} is only partly covered by {}",
                    range, other
                )));
            }
            to.extend(pieces);
        }

        let from_ratio = self.from_ratio * other.from_ratio;
        let to_ratio = self.to_ratio * other.to_ratio;
        let divisor = gcd(from_ratio, to_ratio);

        CoordinateMap::new(
            self.from_ranges.clone(),
            to,
            from_ratio / divisor,
            to_ratio / divisor,
        )
    }
}

impl std::fmt::Display for CoordinateMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (a, b) in &self.from_ranges {
            write!(f, " [{}, {}]", a, b)?;
        }
        write!(f, " ] {}:{} to [", self.from_ratio, self.to_ratio)?;
        for (a, b) in &self.to_ranges {
            write!(f, " [{}, {}]", a, b)?;
        }
        write!(f, " ]")
    }
}

fn lowest(spans: &[Span]) -> i64 {
    spans.iter().map(|s| s.0.min(s.1)).min().unwrap_or(0)
}

fn highest(spans: &[Span]) -> i64 {
    spans.iter().map(|s| s.0.max(s.1)).max().unwrap_or(0)
}

// within-range and between-range steps telescope to last end minus first start
fn net_direction(spans: &[Span]) -> i64 {
    match (spans.first(), spans.last()) {
        (Some(first), Some(last)) => last.1 - first.0,
        _ => 0,
    }
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a.max(1)
    } else {
        gcd(b, a % b)
    }
}

fn coalesce(spans: &[Span]) -> Vec<Span> {
    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());

    for &span in spans {
        if let Some(last) = merged.last_mut() {
            let last_dir = (last.1 - last.0).signum();
            let dir = (span.1 - span.0).signum();
            let step = span.0 - last.1;
            let joined = if last_dir != 0 {
                last_dir
            } else if dir != 0 {
                dir
            } else {
                step
            };
            if step.abs() == 1
                && step == joined
                && (last_dir == 0 || last_dir == joined)
                && (dir == 0 || dir == joined)
            {
                last.1 = span.1;
                continue;
            }
        }
        merged.push(span);
    }

    merged
}

/// 0-based offset of `pos` along the traversal of `spans`
fn offset_of(spans: &[Span], pos: i64) -> Option<i64> {
    let mut traversed = 0;
    for &(start, end) in spans {
        if start <= end {
            if (start..=end).contains(&pos) {
                return Some(traversed + pos - start);
            }
        } else if (end..=start).contains(&pos) {
            return Some(traversed + start - pos);
        }
        traversed += span_len((start, end));
    }
    None
}

/// Position reached after walking `offset` positions along `spans`
fn position_at(spans: &[Span], offset: i64) -> Option<i64> {
    if offset < 0 {
        return None;
    }
    let mut traversed = 0;
    for &(start, end) in spans {
        let len = span_len((start, end));
        if offset < traversed + len {
            let k = offset - traversed;
            return Some(if start <= end { start + k } else { start - k });
        }
        traversed += len;
    }
    None
}

fn map_positions(
    begin: i64,
    end: i64,
    source: &[Span],
    target: &[Span],
    source_word: u32,
    target_word: u32,
) -> Option<Vec<Span>> {
    let (lo, hi) = if end < begin { (end, begin) } else { (begin, end) };
    let source_word = i64::from(source_word);
    let target_word = i64::from(target_word);

    // overlapped offsets along the source, converted to target offsets
    let mut offsets: Vec<(i64, i64)> = Vec::new();
    let mut traversed = 0;
    for &(start, stop) in source {
        let overlap = if start <= stop {
            (lo <= stop && hi >= start)
                .then(|| (traversed + lo.max(start) - start, traversed + hi.min(stop) - start))
        } else {
            (lo <= start && hi >= stop)
                .then(|| (traversed + start - hi.min(start), traversed + start - lo.max(stop)))
        };

        if let Some((mut first, mut last)) = overlap {
            if source_word != target_word {
                first = (first / source_word) * target_word;
                last = (last / source_word) * target_word + target_word - 1;
            }
            offsets.push((first, last));
        }
        traversed += span_len((start, stop));
    }

    if offsets.is_empty() {
        return None;
    }

    offsets.sort_unstable();
    let mut merged: Vec<(i64, i64)> = Vec::with_capacity(offsets.len());
    for (first, last) in offsets {
        match merged.last_mut() {
            Some(prev) if first <= prev.1 + 1 => prev.1 = prev.1.max(last),
            _ => merged.push((first, last)),
        }
    }

    let mut mapped = Vec::new();
    let mut traversed = 0;
    for &(start, stop) in target {
        let len = span_len((start, stop));
        let step = if stop < start { -1 } else { 1 };
        for &(first, last) in &merged {
            let from = first.max(traversed);
            let to = last.min(traversed + len - 1);
            if from <= to {
                mapped.push((
                    start + step * (from - traversed),
                    start + step * (to - traversed),
                ));
            }
        }
        traversed += len;
    }

    (!mapped.is_empty()).then_some(mapped)
}
