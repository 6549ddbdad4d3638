//! Index lists for `C(I,J)` addressing
//!
//! An index list maps a position `k` in the assignment's local index space
//! (`0..len`) to a position in the target matrix. Colon ranges and "all" are
//! never materialised.

use crate::error::{Error, Result};

/// How an index list is represented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    All,
    Range,
    Stride,
    List,
}

/// Row or column index list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexList {
    /// Identity `0..n`
    All(usize),
    /// Colon expression `start:stride:end`, end inclusive, stride nonzero
    Range {
        start: usize,
        stride: isize,
        end: usize,
    },
    /// Explicit list of indices
    List(Vec<usize>),
}

impl IndexList {
    /// `0..n`
    pub fn all(n: usize) -> Self {
        Self::All(n)
    }

    /// `start..=end` with unit stride
    pub fn range(start: usize, end: usize) -> Self {
        Self::Range {
            start,
            stride: 1,
            end,
        }
    }

    /// `start:stride:end`
    pub fn strided(start: usize, stride: isize, end: usize) -> Self {
        Self::Range { start, stride, end }
    }

    /// Explicit list
    pub fn list(indices: Vec<usize>) -> Self {
        Self::List(indices)
    }

    /// Single index
    pub fn single(index: usize) -> Self {
        Self::List(vec![index])
    }

    pub fn kind(&self) -> IndexKind {
        match self {
            Self::All(_) => IndexKind::All,
            Self::Range { stride: 1, .. } => IndexKind::Range,
            Self::Range { .. } => IndexKind::Stride,
            Self::List(_) => IndexKind::List,
        }
    }

    /// Number of entries in the list
    pub fn len(&self) -> usize {
        match self {
            Self::All(n) => *n,
            Self::Range { start, stride, end } => {
                let (start, end) = (*start, *end);
                if *stride > 0 {
                    if start > end {
                        0
                    } else {
                        (end - start) / stride.unsigned_abs() + 1
                    }
                } else if *stride < 0 {
                    if start < end {
                        0
                    } else {
                        (start - end) / stride.unsigned_abs() + 1
                    }
                } else {
                    0
                }
            }
            Self::List(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve local position `k` to a target index (`ijlist`)
    ///
    /// `k` must be less than `len()`.
    #[inline(always)]
    pub fn get(&self, k: usize) -> usize {
        match self {
            Self::All(_) => k,
            Self::Range { start, stride, .. } => {
                (*start as isize + (k as isize) * *stride) as usize
            }
            Self::List(list) => list[k],
        }
    }

    /// Whether the list is the identity over `0..dim`
    pub fn covers_all(&self, dim: usize) -> bool {
        match self {
            Self::All(n) => *n == dim,
            Self::Range {
                start: 0,
                stride: 1,
                end,
            } => dim > 0 && *end == dim - 1,
            _ => false,
        }
    }

    /// Iterate over resolved target indices
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).map(move |k| self.get(k))
    }

    /// Check every index is `< dim` and no index repeats
    pub fn validate(&self, dim: usize) -> Result<()> {
        match self {
            Self::All(n) => {
                if *n > dim {
                    return Err(Error::IndexOutOfBounds {
                        index: n - 1,
                        dim,
                    });
                }
            }
            Self::Range { stride, .. } => {
                if *stride == 0 {
                    return Err(Error::InvalidParameter(
                        "colon stride must be nonzero".to_string(),
                    ));
                }
                let len = self.len();
                if len > 0 {
                    // monotone, so the extremes are the ends
                    let hi = self.get(0).max(self.get(len - 1));
                    if hi >= dim {
                        return Err(Error::IndexOutOfBounds { index: hi, dim });
                    }
                }
            }
            Self::List(list) => {
                if let Some(&bad) = list.iter().find(|&&i| i >= dim) {
                    return Err(Error::IndexOutOfBounds { index: bad, dim });
                }
                let mut sorted = list.clone();
                sorted.sort_unstable();
                if let Some(pair) = sorted.windows(2).find(|w| w[0] == w[1]) {
                    return Err(Error::DuplicateIndex { index: pair[0] });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all() {
        let all = IndexList::all(4);
        assert_eq!(all.len(), 4);
        assert_eq!(all.get(3), 3);
        assert_eq!(all.kind(), IndexKind::All);
        assert!(all.covers_all(4));
        assert!(!all.covers_all(5));
    }

    #[test]
    fn test_colon_ranges() {
        let r = IndexList::range(1, 3);
        assert_eq!(r.iter().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(r.kind(), IndexKind::Range);

        let s = IndexList::strided(0, 2, 7);
        assert_eq!(s.iter().collect::<Vec<_>>(), vec![0, 2, 4, 6]);
        assert_eq!(s.kind(), IndexKind::Stride);

        let down = IndexList::strided(5, -2, 0);
        assert_eq!(down.iter().collect::<Vec<_>>(), vec![5, 3, 1]);

        assert!(IndexList::range(3, 1).is_empty());
        assert!(IndexList::strided(1, -1, 3).is_empty());
        assert!(IndexList::range(0, 2).covers_all(3));
    }

    #[test]
    fn test_list() {
        let l = IndexList::list(vec![3, 0, 2]);
        assert_eq!(l.len(), 3);
        assert_eq!(l.get(0), 3);
        assert_eq!(l.get(2), 2);
        assert!(!l.covers_all(3));
    }

    #[test]
    fn test_validate() {
        assert!(IndexList::all(3).validate(3).is_ok());
        assert!(matches!(
            IndexList::all(4).validate(3),
            Err(Error::IndexOutOfBounds { index: 3, dim: 3 })
        ));
        assert!(matches!(
            IndexList::list(vec![0, 2, 0]).validate(3),
            Err(Error::DuplicateIndex { index: 0 })
        ));
        assert!(matches!(
            IndexList::list(vec![0, 5]).validate(3),
            Err(Error::IndexOutOfBounds { index: 5, dim: 3 })
        ));
        assert!(matches!(
            IndexList::strided(0, 0, 2).validate(3),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            IndexList::strided(6, -3, 0).validate(6),
            Err(Error::IndexOutOfBounds { index: 6, dim: 6 })
        ));
        assert!(IndexList::strided(5, -3, 0).validate(6).is_ok());
    }
}
