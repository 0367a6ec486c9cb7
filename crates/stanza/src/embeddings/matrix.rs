//! # Dense Row-Major Matrix

use crate::{
    errors::{StanzaError, StanzaResult},
    types::TokenId,
};

/// A dense ``(rows, dim)`` matrix of ``f32``, stored row-major.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddingMatrix {
    rows: usize,
    dim: usize,
    data: Vec<f32>,
}

impl EmbeddingMatrix {
    /// Wrap row-major data.
    ///
    /// ## Returns
    /// The matrix; or [`StanzaError::ShapeMismatch`] if
    /// ``data.len() != rows * dim``.
    pub fn new(
        rows: usize,
        dim: usize,
        data: Vec<f32>,
    ) -> StanzaResult<Self> {
        if rows.checked_mul(dim) != Some(data.len()) {
            return Err(StanzaError::ShapeMismatch(format!(
                "{} values cannot fill a ({rows}, {dim}) matrix",
                data.len()
            )));
        }
        Ok(Self { rows, dim, data })
    }

    /// A ``(rows, dim)`` matrix of zeros.
    pub fn zeros(
        rows: usize,
        dim: usize,
    ) -> Self {
        Self {
            rows,
            dim,
            data: vec![0.0; rows * dim],
        }
    }

    /// Stack rows into a matrix.
    ///
    /// An empty input gives a ``(0, 0)`` matrix; ragged rows are a
    /// [`StanzaError::ShapeMismatch`].
    pub fn from_rows<I, R>(rows: I) -> StanzaResult<Self>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[f32]>,
    {
        let mut dim = None;
        let mut n = 0;
        let mut data = Vec::new();
        for row in rows {
            let row = row.as_ref();
            let expected = *dim.get_or_insert(row.len());
            if row.len() != expected {
                return Err(StanzaError::ShapeMismatch(format!(
                    "row {n} has width {}, expected {expected}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
            n += 1;
        }
        Ok(Self {
            rows: n,
            dim: dim.unwrap_or(0),
            data,
        })
    }

    /// The number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// The width of each row.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// The row-major data.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Consume the matrix, returning the row-major data.
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Get row `id`.
    ///
    /// ## Panics
    /// If ``id >= self.rows()``.
    pub fn row(
        &self,
        id: TokenId,
    ) -> &[f32] {
        assert!(id < self.rows, "row {id} out of range for {} rows", self.rows);
        &self.data[id * self.dim..(id + 1) * self.dim]
    }

    /// Get row `id`, if in range.
    pub fn get_row(
        &self,
        id: TokenId,
    ) -> Option<&[f32]> {
        (id < self.rows).then(|| self.row(id))
    }

    pub(crate) fn row_mut(
        &mut self,
        id: TokenId,
    ) -> &mut [f32] {
        let dim = self.dim;
        &mut self.data[id * dim..(id + 1) * dim]
    }

    /// Iterate over the rows in order.
    pub fn iter_rows(&self) -> impl ExactSizeIterator<Item = &[f32]> + '_ {
        (0..self.rows).map(|id| self.row(id))
    }

    /// Gather rows into a new matrix, in the order given.
    ///
    /// ## Returns
    /// The new matrix; or [`StanzaError::IndexOutOfRange`].
    pub fn select_rows(
        &self,
        ids: &[TokenId],
    ) -> StanzaResult<Self> {
        let mut data = Vec::with_capacity(ids.len() * self.dim);
        for &id in ids {
            let row = self.get_row(id).ok_or(StanzaError::IndexOutOfRange {
                index: id,
                len: self.rows,
            })?;
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: ids.len(),
            dim: self.dim,
            data,
        })
    }
}
