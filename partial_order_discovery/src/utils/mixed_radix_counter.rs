#[derive(Debug, Clone)]
///
/// Odometer over a vector of digit ranges
///
/// Yields every digit vector `d` with `d[i] < ranges[i]`, starting with all zeros.
/// The lowest digit is incremented first and carries into the next digit when it wraps.
/// A single zero range means there is no combination at all; no ranges yield exactly one
/// (empty) combination.
///
pub struct MixedRadixCounter {
    ranges: Vec<usize>,
    next: Option<Vec<usize>>,
}

impl MixedRadixCounter {
    /// Create a counter for the given ranges
    pub fn new(ranges: Vec<usize>) -> Self {
        let next = if ranges.iter().any(|r| *r == 0) {
            None
        } else {
            Some(vec![0; ranges.len()])
        };
        Self { ranges, next }
    }

    /// Number of combinations in total
    pub fn combinations(&self) -> usize {
        self.ranges.iter().product()
    }

    /// Skip all combinations that agree with `digits` on `position` and every higher digit
    ///
    /// Iteration continues with the first combination past them.
    pub fn skip_past(&mut self, digits: &[usize], position: usize) {
        let mut following = digits.to_vec();
        following[..position].fill(0);
        for (digit, range) in following.iter_mut().zip(&self.ranges).skip(position) {
            *digit += 1;
            if *digit < *range {
                self.next = Some(following);
                return;
            }
            *digit = 0;
        }
        self.next = None;
    }
}

impl Iterator for MixedRadixCounter {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        let mut following = current.clone();
        for (digit, range) in following.iter_mut().zip(&self.ranges) {
            *digit += 1;
            if *digit < *range {
                self.next = Some(following);
                return Some(current);
            }
            *digit = 0;
        }
        // Every digit wrapped: this was the last combination
        Some(current)
    }
}
