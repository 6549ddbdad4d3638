//! Matrix containers
//!
//! A matrix is `vlen × vdim`: `vdim` vectors of length `vlen`. When `by_col`
//! is set the vectors are columns (`vlen = nrows`), otherwise rows. The
//! logical position of entry `(i, j)` (index `i` within vector `j`) is
//! `p = i + j * vlen`.
//!
//! Four physical formats are supported:
//!
//! - **Hypersparse**: only non-empty vectors are listed (`h`), with
//!   compressed pointers `p` and indices `i`.
//! - **Sparse**: compressed pointers for every vector.
//! - **Bitmap**: dense values plus one presence byte per position.
//! - **Full**: dense values, every position present.
//!
//! Values are either an array or a single iso value shared by every entry.

use crate::element::Element;

/// Physical format of a matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Hypersparse,
    Sparse,
    Bitmap,
    Full,
}

impl Format {
    /// Sparse or hypersparse
    pub fn is_sparse_like(self) -> bool {
        matches!(self, Self::Hypersparse | Self::Sparse)
    }

    /// Bitmap or full
    pub fn is_dense_like(self) -> bool {
        matches!(self, Self::Bitmap | Self::Full)
    }
}

/// Pattern storage
#[derive(Debug, Clone, PartialEq)]
pub enum Storage {
    Hypersparse {
        p: Vec<usize>,
        h: Vec<usize>,
        i: Vec<usize>,
    },
    Sparse {
        p: Vec<usize>,
        i: Vec<usize>,
    },
    Bitmap {
        b: Vec<u8>,
    },
    Full,
}

/// Entry values
#[derive(Debug, Clone, PartialEq)]
pub enum Values<T> {
    Array(Vec<T>),
    Iso(T),
}

impl<T: Copy> Values<T> {
    /// Value stored for entry slot `p`
    #[inline(always)]
    pub fn get(&self, p: usize) -> T {
        match self {
            Self::Array(x) => x[p],
            Self::Iso(v) => *v,
        }
    }

    pub fn is_iso(&self) -> bool {
        matches!(self, Self::Iso(_))
    }

    pub fn iso_value(&self) -> Option<T> {
        match self {
            Self::Iso(v) => Some(*v),
            Self::Array(_) => None,
        }
    }
}

/// Borrowed compressed pattern of a sparse or hypersparse matrix
#[derive(Debug, Clone, Copy)]
pub struct SparseParts<'a> {
    /// Vector pointers, `nvec + 1` long
    pub p: &'a [usize],
    /// Vector indices when hypersparse
    pub h: Option<&'a [usize]>,
    /// Indices within each vector, ascending
    pub i: &'a [usize],
}

impl SparseParts<'_> {
    /// Number of stored vectors
    #[inline]
    pub fn nvec(&self) -> usize {
        self.p.len() - 1
    }

    /// Vector index of the `k`-th stored vector
    #[inline(always)]
    pub fn vector(&self, k: usize) -> usize {
        match self.h {
            Some(h) => h[k],
            None => k,
        }
    }

    /// Number of entries
    #[inline]
    pub fn nnz(&self) -> usize {
        self.p[self.p.len() - 1]
    }
}

/// Mutable access to a matrix's internals for the assignment kernels
pub struct MatrixPartsMut<'a, T> {
    pub vlen: usize,
    pub vdim: usize,
    pub storage: &'a mut Storage,
    pub values: &'a mut Values<T>,
    pub nvals: &'a mut usize,
}

/// A sparse, hypersparse, bitmap or full matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T: Element> {
    vlen: usize,
    vdim: usize,
    by_col: bool,
    storage: Storage,
    values: Values<T>,
    nvals: usize,
}

fn checked_size(vlen: usize, vdim: usize) -> usize {
    vlen.checked_mul(vdim)
        .unwrap_or_else(|| panic!("Matrix dimensions {vlen}x{vdim} overflow usize"))
}

impl<T: Element> Matrix<T> {
    /// Empty bitmap matrix held by column
    pub fn bitmap(nrows: usize, ncols: usize) -> Self {
        Self::bitmap_with(nrows, ncols, true)
    }

    /// Empty bitmap matrix with the given orientation
    pub fn bitmap_with(nrows: usize, ncols: usize, by_col: bool) -> Self {
        let (vlen, vdim) = if by_col { (nrows, ncols) } else { (ncols, nrows) };
        let n = checked_size(vlen, vdim);
        Self {
            vlen,
            vdim,
            by_col,
            storage: Storage::Bitmap { b: vec![0; n] },
            values: Values::Array(vec![T::default(); n]),
            nvals: 0,
        }
    }

    /// Full matrix where every entry holds `value`, stored iso
    pub fn full_iso(nrows: usize, ncols: usize, value: T) -> Self {
        let n = checked_size(nrows, ncols);
        Self {
            vlen: nrows,
            vdim: ncols,
            by_col: true,
            storage: Storage::Full,
            values: Values::Iso(value),
            nvals: n,
        }
    }

    /// Full matrix with entry `(row, col) = f(row, col)`
    pub fn full_from_fn<F>(nrows: usize, ncols: usize, by_col: bool, f: F) -> Self
    where
        F: Fn(usize, usize) -> T,
    {
        let (vlen, vdim) = if by_col { (nrows, ncols) } else { (ncols, nrows) };
        let n = checked_size(vlen, vdim);
        let mut x = Vec::with_capacity(n);
        for j in 0..vdim {
            for i in 0..vlen {
                let (row, col) = if by_col { (i, j) } else { (j, i) };
                x.push(f(row, col));
            }
        }
        Self {
            vlen,
            vdim,
            by_col,
            storage: Storage::Full,
            values: Values::Array(x),
            nvals: n,
        }
    }

    /// Build a column-oriented matrix from `(row, col, value)` triplets
    ///
    /// Later triplets overwrite earlier ones at the same position.
    ///
    /// # Panics
    /// - If a triplet is out of bounds
    /// - If `format` is `Full` and some position has no triplet
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        triplets: &[(usize, usize, T)],
        format: Format,
    ) -> Self {
        Self::from_triplets_with(nrows, ncols, true, triplets, format)
    }

    /// Build a matrix with the given orientation from `(row, col, value)` triplets
    pub fn from_triplets_with(
        nrows: usize,
        ncols: usize,
        by_col: bool,
        triplets: &[(usize, usize, T)],
        format: Format,
    ) -> Self {
        let (vlen, vdim) = if by_col { (nrows, ncols) } else { (ncols, nrows) };
        let n = checked_size(vlen, vdim);

        // (j, i, value) sorted by vector then index, last duplicate wins
        let mut keyed: Vec<(usize, usize, usize, T)> = triplets
            .iter()
            .enumerate()
            .map(|(order, &(row, col, v))| {
                assert!(
                    row < nrows && col < ncols,
                    "Entry ({row}, {col}) out of bounds for {nrows}x{ncols}"
                );
                let (i, j) = if by_col { (row, col) } else { (col, row) };
                (j, i, order, v)
            })
            .collect();
        keyed.sort_unstable_by_key(|&(j, i, order, _)| (j, i, order));
        let mut entries: Vec<(usize, usize, T)> = Vec::with_capacity(keyed.len());
        for (j, i, _, v) in keyed {
            match entries.last_mut() {
                Some(last) if last.0 == j && last.1 == i => last.2 = v,
                _ => entries.push((j, i, v)),
            }
        }
        let nvals = entries.len();

        let (storage, values) = match format {
            Format::Full => {
                assert_eq!(nvals, n, "Full matrix needs every position present");
                let x = entries.iter().map(|&(_, _, v)| v).collect();
                (Storage::Full, Values::Array(x))
            }
            Format::Bitmap => {
                let mut b = vec![0u8; n];
                let mut x = vec![T::default(); n];
                for &(j, i, v) in &entries {
                    b[i + j * vlen] = 1;
                    x[i + j * vlen] = v;
                }
                (Storage::Bitmap { b }, Values::Array(x))
            }
            Format::Sparse => {
                let mut p = vec![0usize; vdim + 1];
                for &(j, _, _) in &entries {
                    p[j + 1] += 1;
                }
                for j in 0..vdim {
                    p[j + 1] += p[j];
                }
                let i = entries.iter().map(|&(_, i, _)| i).collect();
                let x = entries.iter().map(|&(_, _, v)| v).collect();
                (Storage::Sparse { p, i }, Values::Array(x))
            }
            Format::Hypersparse => {
                let mut h: Vec<usize> = Vec::new();
                let mut p = vec![0usize];
                for (k, &(j, _, _)) in entries.iter().enumerate() {
                    if h.last() != Some(&j) {
                        if !h.is_empty() {
                            p.push(k);
                        }
                        h.push(j);
                    }
                }
                if !h.is_empty() {
                    p.push(nvals);
                }
                let i = entries.iter().map(|&(_, i, _)| i).collect();
                let x = entries.iter().map(|&(_, _, v)| v).collect();
                (Storage::Hypersparse { p, h, i }, Values::Array(x))
            }
        };

        Self {
            vlen,
            vdim,
            by_col,
            storage,
            values,
            nvals,
        }
    }

    /// Assemble a matrix from raw parts
    ///
    /// # Panics
    /// If the parts are inconsistent with the dimensions
    pub fn from_parts(
        vlen: usize,
        vdim: usize,
        by_col: bool,
        storage: Storage,
        values: Values<T>,
        nvals: usize,
    ) -> Self {
        let n = checked_size(vlen, vdim);
        match &storage {
            Storage::Bitmap { b } => assert_eq!(b.len(), n, "bitmap length"),
            Storage::Full => assert_eq!(nvals, n, "full matrix nvals"),
            Storage::Sparse { p, .. } => assert_eq!(p.len(), vdim + 1, "sparse pointers"),
            Storage::Hypersparse { p, h, .. } => assert_eq!(p.len(), h.len() + 1, "hyper pointers"),
        }
        if let Values::Array(x) = &values {
            let expected = match &storage {
                Storage::Bitmap { .. } | Storage::Full => n,
                Storage::Sparse { i, .. } | Storage::Hypersparse { i, .. } => i.len(),
            };
            assert_eq!(x.len(), expected, "value array length");
        }
        Self {
            vlen,
            vdim,
            by_col,
            storage,
            values,
            nvals,
        }
    }

    pub fn nrows(&self) -> usize {
        if self.by_col {
            self.vlen
        } else {
            self.vdim
        }
    }

    pub fn ncols(&self) -> usize {
        if self.by_col {
            self.vdim
        } else {
            self.vlen
        }
    }

    /// `(nrows, ncols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    #[inline]
    pub fn vlen(&self) -> usize {
        self.vlen
    }

    #[inline]
    pub fn vdim(&self) -> usize {
        self.vdim
    }

    /// Number of logical positions, `vlen * vdim`
    #[inline]
    pub fn size(&self) -> usize {
        self.vlen * self.vdim
    }

    pub fn is_by_col(&self) -> bool {
        self.by_col
    }

    pub fn format(&self) -> Format {
        match self.storage {
            Storage::Hypersparse { .. } => Format::Hypersparse,
            Storage::Sparse { .. } => Format::Sparse,
            Storage::Bitmap { .. } => Format::Bitmap,
            Storage::Full => Format::Full,
        }
    }

    /// Number of present entries
    #[inline]
    pub fn nvals(&self) -> usize {
        self.nvals
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn values(&self) -> &Values<T> {
        &self.values
    }

    pub fn is_iso(&self) -> bool {
        self.values.is_iso()
    }

    /// Presence bytes of a bitmap matrix
    pub fn presence(&self) -> Option<&[u8]> {
        match &self.storage {
            Storage::Bitmap { b } => Some(b),
            _ => None,
        }
    }

    /// Compressed pattern of a sparse or hypersparse matrix
    pub fn sparse_parts(&self) -> Option<SparseParts<'_>> {
        match &self.storage {
            Storage::Sparse { p, i } => Some(SparseParts { p, h: None, i }),
            Storage::Hypersparse { p, h, i } => Some(SparseParts { p, h: Some(h), i }),
            _ => None,
        }
    }

    /// Mutable internals for the assignment kernels
    pub fn parts_mut(&mut self) -> MatrixPartsMut<'_, T> {
        MatrixPartsMut {
            vlen: self.vlen,
            vdim: self.vdim,
            storage: &mut self.storage,
            values: &mut self.values,
            nvals: &mut self.nvals,
        }
    }

    /// Entry at logical `(row, col)`, if present
    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        let (i, j) = if self.by_col { (row, col) } else { (col, row) };
        if i >= self.vlen || j >= self.vdim {
            return None;
        }
        match &self.storage {
            Storage::Full => Some(self.values.get(i + j * self.vlen)),
            Storage::Bitmap { b } => {
                let p = i + j * self.vlen;
                (b[p] != 0).then(|| self.values.get(p))
            }
            Storage::Sparse { p, i: ind } => {
                let range = p[j]..p[j + 1];
                ind[range.clone()]
                    .binary_search(&i)
                    .ok()
                    .map(|k| self.values.get(range.start + k))
            }
            Storage::Hypersparse { p, h, i: ind } => {
                let k = h.binary_search(&j).ok()?;
                let range = p[k]..p[k + 1];
                ind[range.clone()]
                    .binary_search(&i)
                    .ok()
                    .map(|q| self.values.get(range.start + q))
            }
        }
    }

    /// Visit every present entry as `(i, j, slot)` in vector order
    pub fn for_each_entry<F: FnMut(usize, usize, usize)>(&self, mut f: F) {
        match &self.storage {
            Storage::Full => {
                for j in 0..self.vdim {
                    for i in 0..self.vlen {
                        f(i, j, i + j * self.vlen);
                    }
                }
            }
            Storage::Bitmap { b } => {
                for j in 0..self.vdim {
                    for i in 0..self.vlen {
                        let p = i + j * self.vlen;
                        if b[p] != 0 {
                            f(i, j, p);
                        }
                    }
                }
            }
            Storage::Sparse { .. } | Storage::Hypersparse { .. } => {
                if let Some(parts) = self.sparse_parts() {
                    for k in 0..parts.nvec() {
                        let j = parts.vector(k);
                        for slot in parts.p[k]..parts.p[k + 1] {
                            f(parts.i[slot], j, slot);
                        }
                    }
                }
            }
        }
    }

    /// All present entries as `(row, col, value)`, sorted by row then column
    pub fn to_triplets(&self) -> Vec<(usize, usize, T)> {
        let mut out = Vec::with_capacity(self.nvals);
        self.for_each_entry(|i, j, slot| {
            let (row, col) = if self.by_col { (i, j) } else { (j, i) };
            out.push((row, col, self.values.get(slot)));
        });
        out.sort_unstable_by_key(|&(row, col, _)| (row, col));
        out
    }

    /// Count present positions by scanning (tests and debug checks only)
    pub fn count_present(&self) -> usize {
        match &self.storage {
            Storage::Bitmap { b } => b.iter().filter(|&&x| x != 0).count(),
            Storage::Full => self.size(),
            Storage::Sparse { i, .. } | Storage::Hypersparse { i, .. } => i.len(),
        }
    }

    /// Every presence byte is 0 or 1 and `nvals` matches the pattern
    pub fn presence_invariant_holds(&self) -> bool {
        let bytes_ok = match &self.storage {
            Storage::Bitmap { b } => b.iter().all(|&x| x <= 1),
            _ => true,
        };
        bytes_ok && self.nvals == self.count_present()
    }

    /// Drop the presence array when every position is present
    ///
    /// Returns whether a conversion happened.
    pub fn conform_full(&mut self) -> bool {
        if matches!(self.storage, Storage::Bitmap { .. }) && self.nvals == self.size() {
            self.storage = Storage::Full;
            log::trace!("converted {}x{} bitmap to full", self.nrows(), self.ncols());
            true
        } else {
            false
        }
    }

    /// Replace the whole matrix with a full one of the same shape
    pub fn set_full(&mut self, values: Values<T>) {
        if let Values::Array(x) = &values {
            assert_eq!(x.len(), self.size(), "full value array length");
        }
        self.storage = Storage::Full;
        self.values = values;
        self.nvals = self.size();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<(usize, usize, f64)> {
        vec![(0, 1, 1.5), (2, 0, 2.5), (1, 1, 3.5), (2, 2, 4.5)]
    }

    #[test]
    fn test_formats_agree() {
        for format in [Format::Hypersparse, Format::Sparse, Format::Bitmap] {
            for by_col in [true, false] {
                let m = Matrix::from_triplets_with(3, 3, by_col, &sample(), format);
                assert_eq!(m.nvals(), 4);
                assert_eq!(m.format(), format);
                assert_eq!(m.get(0, 1), Some(1.5));
                assert_eq!(m.get(2, 0), Some(2.5));
                assert_eq!(m.get(0, 0), None);
                let mut expected = sample();
                expected.sort_by_key(|&(r, c, _)| (r, c));
                assert_eq!(m.to_triplets(), expected);
                assert!(m.presence_invariant_holds());
            }
        }
    }

    #[test]
    fn test_hypersparse_lists_nonempty_vectors() {
        let m = Matrix::from_triplets(4, 5, &[(1, 4, 1i32), (0, 1, 2), (3, 1, 3)], Format::Hypersparse);
        let parts = m.sparse_parts().unwrap();
        assert_eq!(parts.h, Some(&[1usize, 4][..]));
        assert_eq!(parts.p, &[0, 2, 3]);
        assert_eq!(parts.i, &[0, 3, 1]);
        assert_eq!(parts.nvec(), 2);
        assert_eq!(parts.vector(1), 4);
        assert_eq!(parts.nnz(), 3);
    }

    #[test]
    fn test_duplicate_triplets_last_wins() {
        let m = Matrix::from_triplets(2, 2, &[(0, 0, 1u8), (0, 0, 9)], Format::Sparse);
        assert_eq!(m.nvals(), 1);
        assert_eq!(m.get(0, 0), Some(9));
    }

    #[test]
    fn test_full_from_fn_orientation() {
        let by_col = Matrix::full_from_fn(2, 3, true, |r, c| (r * 3 + c) as i32);
        let by_row = Matrix::full_from_fn(2, 3, false, |r, c| (r * 3 + c) as i32);
        assert_eq!(by_col.vlen(), 2);
        assert_eq!(by_row.vlen(), 3);
        assert_eq!(by_col.to_triplets(), by_row.to_triplets());
        assert_eq!(by_row.get(1, 2), Some(5));
    }

    #[test]
    fn test_bitmap_full_conversions() {
        let mut m = Matrix::from_triplets(2, 2, &[(0, 0, 1i64), (1, 0, 2), (0, 1, 3), (1, 1, 4)], Format::Bitmap);
        assert!(m.conform_full());
        assert_eq!(m.format(), Format::Full);
        assert_eq!(m.get(1, 1), Some(4));
        assert!(!m.conform_full());

        let mut partial = Matrix::<i64>::bitmap(2, 2);
        assert!(!partial.conform_full());
        partial.set_full(Values::Iso(5));
        assert_eq!(partial.nvals(), 4);
        assert_eq!(partial.get(0, 1), Some(5));
        assert!(partial.presence_invariant_holds());
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_out_of_bounds_triplet() {
        Matrix::from_triplets(2, 2, &[(2, 0, 1.0)], Format::Bitmap);
    }
}
