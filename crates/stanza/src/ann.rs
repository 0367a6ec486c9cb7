//! # Approximate Nearest Neighbours
//!
//! A random-hyperplane locality-sensitive hashing index over the rows of an
//! [`EmbeddingMatrix`].
//!
//! Each of ``num_tables`` tables draws ``num_bits`` Gaussian hyperplanes; a
//! row's signature in a table has bit `b` set when the row lies on the
//! non-negative side of hyperplane `b`. Rows with similar direction tend to
//! share signatures, so a query only scores the rows in its own buckets
//! (and, when that is too few, buckets within a small Hamming distance).
//!
//! Candidates are ranked by exact cosine distance, ``1 - cos(query, row)``.

use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, StandardNormal};

use crate::{
    embeddings::EmbeddingMatrix,
    errors::{StanzaError, StanzaResult},
    types::{CommonHashMap, CommonHashSet, TokenId},
};

/// Signatures are packed into a `u64`.
pub const MAX_LSH_BITS: usize = 64;

/// Options for building an [`LshIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LshOptions {
    /// The number of independent hash tables.
    ///
    /// More tables raise recall at the cost of memory and query time.
    pub num_tables: usize,

    /// The number of hyperplanes (signature bits) per table, at most
    /// [`MAX_LSH_BITS`].
    ///
    /// More bits make buckets smaller and more selective.
    pub num_bits: usize,

    /// Seed for the hyperplane RNG.
    pub seed: u64,

    /// The maximum Hamming distance probed when the exact buckets hold
    /// fewer than `k` candidates.
    pub probe_radius: u32,
}

impl Default for LshOptions {
    fn default() -> Self {
        Self {
            num_tables: 8,
            num_bits: 12,
            seed: 0,
            probe_radius: 1,
        }
    }
}

impl LshOptions {
    /// Sets the number of hash tables.
    pub fn set_num_tables(
        &mut self,
        num_tables: usize,
    ) {
        self.num_tables = num_tables;
    }

    /// Sets the number of hash tables.
    pub fn with_num_tables(
        mut self,
        num_tables: usize,
    ) -> Self {
        self.set_num_tables(num_tables);
        self
    }

    /// Sets the number of signature bits per table.
    pub fn set_num_bits(
        &mut self,
        num_bits: usize,
    ) {
        self.num_bits = num_bits;
    }

    /// Sets the number of signature bits per table.
    pub fn with_num_bits(
        mut self,
        num_bits: usize,
    ) -> Self {
        self.set_num_bits(num_bits);
        self
    }

    /// Sets the hyperplane RNG seed.
    pub fn set_seed(
        &mut self,
        seed: u64,
    ) {
        self.seed = seed;
    }

    /// Sets the hyperplane RNG seed.
    pub fn with_seed(
        mut self,
        seed: u64,
    ) -> Self {
        self.set_seed(seed);
        self
    }

    /// Sets the multi-probe Hamming radius.
    pub fn set_probe_radius(
        &mut self,
        probe_radius: u32,
    ) {
        self.probe_radius = probe_radius;
    }

    /// Sets the multi-probe Hamming radius.
    pub fn with_probe_radius(
        mut self,
        probe_radius: u32,
    ) -> Self {
        self.set_probe_radius(probe_radius);
        self
    }

    /// Build an [`LshIndex`] over the rows of `matrix`.
    pub fn build(
        &self,
        matrix: &EmbeddingMatrix,
    ) -> LshIndex {
        LshIndex::build(matrix, *self)
    }
}

/// Dot product.
pub fn dot(
    a: &[f32],
    b: &[f32],
) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Cosine similarity; 0 when either vector has zero norm.
pub fn cosine_similarity(
    a: &[f32],
    b: &[f32],
) -> f32 {
    let norm = dot(a, a).sqrt() * dot(b, b).sqrt();
    if norm == 0.0 { 0.0 } else { dot(a, b) / norm }
}

/// Random-hyperplane LSH index over the rows of an [`EmbeddingMatrix`].
///
/// The index holds row ids only; queries take the matrix it was built from.
#[derive(Debug, Clone)]
pub struct LshIndex {
    options: LshOptions,
    rows: usize,
    dim: usize,

    /// ``num_tables * num_bits`` hyperplanes of width ``dim``.
    planes: Vec<f32>,

    /// Per-table ``{ signature -> row ids }``, ids ascending.
    tables: Vec<CommonHashMap<u64, Vec<TokenId>>>,
}

impl LshIndex {
    /// Build an index over every row of `matrix`.
    ///
    /// ``options.num_bits`` is clamped to ``1..=MAX_LSH_BITS``.
    pub fn build(
        matrix: &EmbeddingMatrix,
        options: LshOptions,
    ) -> Self {
        let options = LshOptions {
            num_bits: options.num_bits.clamp(1, MAX_LSH_BITS),
            ..options
        };
        let dim = matrix.dim();

        let mut rng = StdRng::seed_from_u64(options.seed);
        let planes: Vec<f32> = (0..options.num_tables * options.num_bits * dim)
            .map(|_| StandardNormal.sample(&mut rng))
            .collect();

        let mut index = Self {
            options,
            rows: matrix.rows(),
            dim,
            planes,
            tables: Vec::with_capacity(options.num_tables),
        };

        for table in 0..options.num_tables {
            let mut buckets: CommonHashMap<u64, Vec<TokenId>> = Default::default();
            for (id, row) in matrix.iter_rows().enumerate() {
                buckets
                    .entry(index.signature(table, row))
                    .or_default()
                    .push(id);
            }
            index.tables.push(buckets);
        }

        log::debug!(
            "built LSH index: {} rows, {} tables x {} bits",
            index.rows,
            options.num_tables,
            options.num_bits,
        );
        index
    }

    /// The (clamped) options the index was built with.
    pub fn options(&self) -> &LshOptions {
        &self.options
    }

    /// The number of indexed rows.
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Is the index empty?
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    fn signature(
        &self,
        table: usize,
        vector: &[f32],
    ) -> u64 {
        let bits = self.options.num_bits;
        let table_planes = &self.planes[table * bits * self.dim..(table + 1) * bits * self.dim];
        let mut sig = 0u64;
        for b in 0..bits {
            let plane = &table_planes[b * self.dim..(b + 1) * self.dim];
            if dot(plane, vector) >= 0.0 {
                sig |= 1 << b;
            }
        }
        sig
    }

    /// Gather candidate rows for a query.
    ///
    /// Starts from the exact-signature buckets of every table; while fewer
    /// than `k` candidates are known, widens to buckets at Hamming distance
    /// ``1..=probe_radius``.
    fn candidates(
        &self,
        vector: &[f32],
        k: usize,
    ) -> CommonHashSet<TokenId> {
        let sigs: Vec<u64> = (0..self.tables.len())
            .map(|t| self.signature(t, vector))
            .collect();

        let mut found: CommonHashSet<TokenId> = Default::default();
        for radius in 0..=self.options.probe_radius {
            if radius > 0 && found.len() >= k {
                break;
            }
            for (table, &sig) in self.tables.iter().zip(&sigs) {
                if radius == 0 {
                    if let Some(ids) = table.get(&sig) {
                        found.extend(ids.iter().copied());
                    }
                    continue;
                }
                for (key, ids) in table {
                    if (key ^ sig).count_ones() == radius {
                        found.extend(ids.iter().copied());
                    }
                }
            }
        }
        found
    }

    /// Query for the `k` nearest rows by cosine distance.
    ///
    /// ## Arguments
    /// * `matrix` - the matrix the index was built from.
    /// * `vector` - the query; must have the matrix's width.
    /// * `k` - the maximum number of results.
    ///
    /// ## Returns
    /// Up to `k` ``(row id, cosine distance)`` pairs, by ascending distance
    /// then ascending id. Fewer than `k` are returned when the probed
    /// buckets hold fewer rows.
    pub fn query(
        &self,
        matrix: &EmbeddingMatrix,
        vector: &[f32],
        k: usize,
    ) -> StanzaResult<Vec<(TokenId, f32)>> {
        if matrix.rows() != self.rows || matrix.dim() != self.dim {
            return Err(StanzaError::ShapeMismatch(format!(
                "index built over ({}, {}), queried with ({}, {})",
                self.rows,
                self.dim,
                matrix.rows(),
                matrix.dim()
            )));
        }
        if vector.len() != self.dim {
            return Err(StanzaError::ShapeMismatch(format!(
                "query has width {}, expected {}",
                vector.len(),
                self.dim
            )));
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(TokenId, f32)> = self
            .candidates(vector, k)
            .into_iter()
            .map(|id| (id, 1.0 - cosine_similarity(vector, matrix.row(id))))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_matrix() -> EmbeddingMatrix {
        // Unit vectors around the circle, plus their scaled copies.
        let rows: Vec<Vec<f32>> = (0..32)
            .map(|i| {
                let theta = (i % 16) as f32 * std::f32::consts::PI / 8.0;
                let scale = if i < 16 { 1.0 } else { 3.0 };
                vec![scale * theta.cos(), scale * theta.sin(), 0.0]
            })
            .collect();
        EmbeddingMatrix::from_rows(rows).unwrap()
    }

    #[test]
    fn test_cosine() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]), 1.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 1.0], &[-1.0, -1.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_options() {
        let opts = LshOptions::default()
            .with_num_tables(4)
            .with_num_bits(100)
            .with_seed(7)
            .with_probe_radius(2);
        assert_eq!(opts.num_tables, 4);
        assert_eq!(opts.seed, 7);

        let index = opts.build(&grid_matrix());
        assert_eq!(index.options().num_bits, MAX_LSH_BITS);
        assert_eq!(index.len(), 32);
        assert!(!index.is_empty());
    }

    #[test]
    fn test_deterministic() {
        let m = grid_matrix();
        let a = LshIndex::build(&m, LshOptions::default().with_seed(3));
        let b = LshIndex::build(&m, LshOptions::default().with_seed(3));
        assert_eq!(a.planes, b.planes);

        let q = [1.0, 0.2, 0.0];
        assert_eq!(a.query(&m, &q, 5).unwrap(), b.query(&m, &q, 5).unwrap());
    }

    #[test]
    fn test_query_finds_self() {
        let m = grid_matrix();
        let index = LshIndex::build(&m, LshOptions::default());

        for id in 0..16 {
            let hits = index.query(&m, m.row(id), 2).unwrap();
            assert!(!hits.is_empty());
            // The row and its scaled copy share a direction and every bucket.
            assert_eq!(hits[0].0 % 16, id);
            assert!(hits[0].1.abs() < 1e-5);
            assert!(hits.len() <= 2);
        }
    }

    #[test]
    fn test_results_sorted() {
        let m = grid_matrix();
        let index = LshIndex::build(&m, LshOptions::default().with_num_bits(2));
        let hits = index.query(&m, &[0.3, 0.7, 0.0], 10).unwrap();
        assert!(hits.len() <= 10);
        for w in hits.windows(2) {
            assert!(w[0].1 < w[1].1 || (w[0].1 == w[1].1 && w[0].0 < w[1].0));
        }
    }

    #[test]
    fn test_query_errors() {
        let m = grid_matrix();
        let index = LshIndex::build(&m, LshOptions::default());
        assert!(matches!(
            index.query(&m, &[1.0, 0.0], 3),
            Err(StanzaError::ShapeMismatch(_))
        ));

        let other = EmbeddingMatrix::zeros(3, 3);
        assert!(matches!(
            index.query(&other, &[1.0, 0.0, 0.0], 3),
            Err(StanzaError::ShapeMismatch(_))
        ));

        assert!(index.query(&m, &[1.0, 0.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_empty_matrix() {
        let m = EmbeddingMatrix::zeros(0, 3);
        let index = LshIndex::build(&m, LshOptions::default());
        assert!(index.is_empty());
        assert!(index.query(&m, &[1.0, 0.0, 0.0], 3).unwrap().is_empty());
    }
}
