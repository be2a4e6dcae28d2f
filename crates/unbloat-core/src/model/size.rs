/// Size accounting and human-readable byte counts.
///
/// All internal sizes are `u64` bytes. Floating point is only used
/// at the display-formatting boundary.
use tracing::warn;

/// Running byte total over a set of candidates.
///
/// The total never goes negative: a subtraction larger than the current
/// total (a directory that grew on disk, or was counted twice) clamps to
/// zero and is logged as a consistency warning instead of panicking.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SizeAggregator {
    total: u64,
}

impl SizeAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Replace the running total with a fresh sum.
    pub fn recompute<I>(&mut self, sizes: I) -> u64
    where
        I: IntoIterator<Item = u64>,
    {
        self.total = sizes.into_iter().fold(0u64, u64::saturating_add);
        self.total
    }

    pub fn add(&mut self, bytes: u64) {
        self.total = self.total.saturating_add(bytes);
    }

    /// Subtract `bytes`, clamping at zero.
    ///
    /// Returns `false` if the subtraction underflowed.
    pub fn subtract(&mut self, bytes: u64) -> bool {
        match self.total.checked_sub(bytes) {
            Some(rest) => {
                self.total = rest;
                true
            }
            None => {
                warn!(
                    total = self.total,
                    delta = bytes,
                    "size total would underflow; clamping to zero"
                );
                self.total = 0;
                false
            }
        }
    }

    pub fn reset(&mut self) {
        self.total = 0;
    }
}

/// Format a byte count into a human-readable string.
///
/// Uses decimal units (KB = 1000) with up to two decimals and trailing
/// zeros trimmed: `1500` → `1.5 KB`, `999` → `999 Bytes`.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1_000.0;
    const MB: f64 = KB * 1_000.0;
    const GB: f64 = MB * 1_000.0;

    let b = bytes as f64;
    if b >= GB {
        format!("{} GB", trim_decimals(b / GB))
    } else if b >= MB {
        format!("{} MB", trim_decimals(b / MB))
    } else if b >= KB {
        format!("{} KB", trim_decimals(b / KB))
    } else {
        format!("{bytes} Bytes")
    }
}

fn trim_decimals(value: f64) -> String {
    let s = format!("{value:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Format a count with thousand separators.
pub fn format_count(count: u64) -> String {
    if count < 1_000 {
        return count.to_string();
    }
    let s = count.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}
