//! # Exact and Approximate Neighbor Search

use core::cmp::Ordering;

use crate::{
    ann::dot,
    embeddings::Embeddings,
    errors::{StanzaError, StanzaResult},
    types::{CommonHashMap, TokenId, hash_map_with_capacity},
};

/// A search result: a token and its score against the query.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    /// The token's id.
    pub id: TokenId,

    /// The token.
    pub token: String,

    /// Inner product (exact search) or cosine similarity (approximate search).
    pub score: f32,
}

impl Embeddings {
    fn check_query(
        &self,
        query: &[f32],
    ) -> StanzaResult<()> {
        if query.len() != self.dim() {
            return Err(StanzaError::ShapeMismatch(format!(
                "query has width {}, embeddings have width {}",
                query.len(),
                self.dim()
            )));
        }
        Ok(())
    }

    fn neighbor(
        &self,
        id: TokenId,
        score: f32,
    ) -> Neighbor {
        Neighbor {
            id,
            token: self.vocab()[id].to_string(),
            score,
        }
    }

    /// The inner product of `query` with every row, in id order.
    ///
    /// Rows are scored in parallel when the ``rayon`` feature is enabled.
    pub fn inner_product_scores(
        &self,
        query: &[f32],
    ) -> StanzaResult<Vec<f32>> {
        self.check_query(query)?;
        let matrix = self.matrix();

        #[cfg(feature = "rayon")]
        let scores: Vec<f32> = {
            use rayon::prelude::*;
            (0..matrix.rows())
                .into_par_iter()
                .map(|id| dot(matrix.row(id), query))
                .collect()
        };
        #[cfg(not(feature = "rayon"))]
        let scores: Vec<f32> = matrix.iter_rows().map(|row| dot(row, query)).collect();

        Ok(scores)
    }

    /// The inner product of `query` with every row, keyed by token.
    ///
    /// ## Returns
    /// A map with one entry per token; or [`StanzaError::ShapeMismatch`]
    /// if the query width differs from [`Embeddings::dim`].
    pub fn inner_products(
        &self,
        query: &[f32],
    ) -> StanzaResult<CommonHashMap<String, f32>> {
        let scores = self.inner_product_scores(query)?;
        let mut products = hash_map_with_capacity(scores.len());
        products.extend(
            self.vocab()
                .iter()
                .map(|(id, word)| (word.to_string(), scores[id])),
        );
        Ok(products)
    }

    /// The `k` tokens with the largest inner product with `query`.
    ///
    /// Exact: every row is scored. Results are ordered by descending score;
    /// equal scores are ordered by ascending id. Returns ``min(k, len)``
    /// results.
    pub fn k_nearest(
        &self,
        query: &[f32],
        k: usize,
    ) -> StanzaResult<Vec<Neighbor>> {
        let scores = self.inner_product_scores(query)?;
        let k = k.min(scores.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        let by_score = |a: &TokenId, b: &TokenId| -> Ordering {
            scores[*b].total_cmp(&scores[*a]).then(a.cmp(b))
        };

        let mut ids: Vec<TokenId> = (0..scores.len()).collect();
        if k < ids.len() {
            ids.select_nth_unstable_by(k - 1, by_score);
            ids.truncate(k);
        }
        ids.sort_unstable_by(by_score);

        Ok(ids
            .into_iter()
            .map(|id| self.neighbor(id, scores[id]))
            .collect())
    }

    /// Approximately the `k` tokens most cosine-similar to `query`.
    ///
    /// Queries the [`LshIndex`](crate::ann::LshIndex) from
    /// [`Embeddings::ann_index`], building it on first use. Scores are
    /// ``1 - cosine_distance``, ordered descending.
    ///
    /// This trades exactness for speed: true neighbors that hash to no
    /// probed bucket are missed, and fewer than `k` results may be returned.
    /// Use [`Embeddings::k_nearest`] when exact results are required.
    pub fn k_nearest_approx(
        &self,
        query: &[f32],
        k: usize,
    ) -> StanzaResult<Vec<Neighbor>> {
        self.check_query(query)?;
        Ok(self
            .ann_index()
            .query(self.matrix(), query, k)?
            .into_iter()
            .map(|(id, distance)| self.neighbor(id, 1.0 - distance))
            .collect())
    }
}
