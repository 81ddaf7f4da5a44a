use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-open `[start, end)` range of weekly slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotInterval {
    pub start: u32,
    pub end: u32,
}

impl SlotInterval {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Overlap of two intervals; touching intervals do not overlap
    #[inline]
    pub fn intersect(&self, other: &SlotInterval) -> Option<SlotInterval> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(SlotInterval { start, end })
    }

    /// The first `length` slots of this interval, if it is long enough
    #[inline]
    pub fn clip(&self, length: u32) -> Option<SlotInterval> {
        (length > 0 && self.len() >= length).then(|| SlotInterval::new(self.start, self.start + length))
    }
}

impl From<(u32, u32)> for SlotInterval {
    fn from((start, end): (u32, u32)) -> Self {
        Self::new(start, end)
    }
}

impl fmt::Display for SlotInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Every positive-length overlap between two availability lists.
///
/// Each list must already be merged (no overlaps within a list); order does
/// not matter. Output is sorted by start.
pub fn intersect_lists(a: &[SlotInterval], b: &[SlotInterval]) -> Vec<SlotInterval> {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_unstable();
    b.sort_unstable();

    let mut result = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        if let Some(overlap) = a[i].intersect(&b[j]) {
            result.push(overlap);
        }

        // Advance whichever interval finishes first
        if a[i].end <= b[j].end {
            i += 1;
        } else {
            j += 1;
        }
    }

    result
}

/// Earliest window every participant can make.
///
/// Participants are folded in the given order; the fold stops as soon as the
/// running intersection is empty. With `meeting_length`, shorter windows are
/// dropped and the result is clipped to exactly that many slots. `None` means
/// no meeting is possible.
pub fn find_meeting_time<P>(participants: &[P], meeting_length: Option<u32>) -> Option<SlotInterval>
where
    P: AsRef<[SlotInterval]>,
{
    let (first, rest) = participants.split_first()?;

    let mut common: Vec<SlotInterval> = first
        .as_ref()
        .iter()
        .copied()
        .filter(|i| !i.is_empty())
        .collect();

    for (step, availability) in rest.iter().enumerate() {
        if common.is_empty() {
            break;
        }
        common = intersect_lists(&common, availability.as_ref());
        tracing::trace!("Fold step {}: {} common windows", step + 1, common.len());
    }

    let earliest = match meeting_length {
        Some(length) => common.iter().filter_map(|w| w.clip(length)).min(),
        None => common.iter().copied().min(),
    };

    if earliest.is_none() {
        tracing::debug!(
            "No common window for {} participants (length: {:?})",
            participants.len(),
            meeting_length
        );
    }

    earliest
}
