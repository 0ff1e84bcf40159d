//! Symmetric block storage for covariance matrices.
//!
//! Purpose
//! -------
//! Store one `ndata × ndata` matrix per unordered pair of data dimensions
//! `(k1, k2)`, so that `Cov(dim k1, dim k2)` and `Cov(dim k2, dim k1)` share
//! a single allocation.
//!
//! Key behaviors
//! -------------
//! - [`SymmetricIndex`] maps an unordered pair onto a dense slot in
//!   `0..n(n+1)/2` (row-major over the upper triangle).
//! - [`SymBlocks`] keeps the block for `(min, max)` oriented as
//!   `Cov(dim min, dim max)`; reads and writes with reversed indices are
//!   transposed transparently.
//!
//! Invariants & assumptions
//! ------------------------
//! - Diagonal pairs start as the identity, off-diagonal pairs as zero.
//! - Every stored block is `ndata × ndata`; shape checks happen in the
//!   setters of the fit data container, not here.
use ndarray::Array2;

/// Dense index over unordered pairs `(k1, k2)` of `0..n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymmetricIndex {
    n: usize,
}

impl SymmetricIndex {
    pub fn new(n: usize) -> Self {
        Self { n }
    }

    /// Number of unordered pairs, `n(n+1)/2`.
    pub fn len(&self) -> usize {
        self.n * (self.n + 1) / 2
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Slot for the pair, or `None` if either index is `>= n`.
    pub fn slot(&self, k1: usize, k2: usize) -> Option<usize> {
        if k1 >= self.n || k2 >= self.n {
            return None;
        }
        let (a, b) = if k1 <= k2 { (k1, k2) } else { (k2, k1) };
        // Row `a` starts after Σ_{r<a} (n - r) entries.
        Some(a * (2 * self.n - a + 1) / 2 + (b - a))
    }
}

/// Symmetric collection of `ndata × ndata` covariance blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct SymBlocks {
    index: SymmetricIndex,
    blocks: Vec<Array2<f64>>,
}

impl SymBlocks {
    /// Identity diagonal blocks and zero off-diagonal blocks.
    pub fn new(ndim: usize, ndata: usize) -> Self {
        let index = SymmetricIndex::new(ndim);
        let mut blocks = vec![Array2::zeros((ndata, ndata)); index.len()];
        for k in 0..ndim {
            if let Some(slot) = index.slot(k, k) {
                blocks[slot] = Array2::eye(ndata);
            }
        }
        Self { index, blocks }
    }

    /// `Cov(dim k1, dim k2)` as an owned, correctly oriented matrix.
    pub fn get(&self, k1: usize, k2: usize) -> Option<Array2<f64>> {
        let block = &self.blocks[self.index.slot(k1, k2)?];
        if k1 <= k2 { Some(block.clone()) } else { Some(block.t().to_owned()) }
    }

    /// Stored block for the unordered pair, oriented as `Cov(min, max)`.
    pub fn stored(&self, k1: usize, k2: usize) -> Option<&Array2<f64>> {
        self.index.slot(k1, k2).map(|slot| &self.blocks[slot])
    }

    /// `true` if a diagonal pair has an off-diagonal entry or an
    /// off-diagonal pair has any non-zero entry.
    pub fn is_correlated(&self) -> bool {
        let n = self.index.n;
        (0..n).flat_map(|k1| (k1..n).map(move |k2| (k1, k2))).any(|(k1, k2)| {
            self.stored(k1, k2).is_some_and(|block| {
                block.indexed_iter().any(|((i, j), v)| (k1 != k2 || i != j) && *v != 0.0)
            })
        })
    }

    /// Store `Cov(dim k1, dim k2) = cov`; returns `false` on a bad index.
    pub fn set(&mut self, k1: usize, k2: usize, cov: Array2<f64>) -> bool {
        match self.index.slot(k1, k2) {
            Some(slot) => {
                self.blocks[slot] = if k1 <= k2 { cov } else { cov.reversed_axes() };
                true
            }
            None => false,
        }
    }
}
