/**
 * LatentReco
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use std::cell::RefCell;
use std::iter;
use std::rc::Rc;

use crate::types::WeightRange;
use crate::vector::{SparseVector, Value};

pub type Entries<'a> = Box<dyn Iterator<Item=(usize, f64)> + 'a>;
pub type Triples<'a> = Box<dyn Iterator<Item=(usize, usize, f64)> + 'a>;

/// A relationship matrix shared between the dataset, its caller and every model built on it.
pub type SharedMatrix = Rc<RefCell<dyn Matrix>>;

/// Weighted relation between `[0, rows)` and `[0, cols)`. Dimensions are fixed at creation;
/// entries can be inserted or overwritten but never removed. Out-of-range indices panic.
pub trait Matrix {
    fn rows(&self) -> usize;
    fn cols(&self) -> usize;
    /// Number of explicit entries.
    fn nnz(&self) -> usize;

    fn get(&self, row: usize, col: usize) -> f64;
    fn set(&mut self, row: usize, col: usize, value: f64);

    fn row<'a>(&'a self, row: usize) -> Entries<'a>;
    fn col<'a>(&'a self, col: usize) -> Entries<'a>;
    /// Every explicit entry in row-major order.
    fn all<'a>(&'a self) -> Triples<'a>;

    fn row_count(&self, row: usize) -> usize;
    fn col_count(&self, col: usize) -> usize;

    /// `out += weight · A·v`
    fn mult(&self, v: &[f64], weight: f64, out: &mut [f64]);
    /// `out += weight · Aᵗ·v`
    fn mult_transpose(&self, v: &[f64], weight: f64, out: &mut [f64]);

    fn is_symmetric(&self) -> bool {
        if self.rows() != self.cols() {
            return false;
        }
        self.all().all(|(row, col, value)| self.get(col, row) == value)
    }
}

/// Sparse matrix stored twice, once by rows and once by columns.
#[derive(Clone, Debug)]
pub struct SparseMatrix<V: Value> {
    by_row: Vec<SparseVector<V>>,
    by_col: Vec<SparseVector<V>>,
    nnz: usize,
}

pub type WeightedMatrix = SparseMatrix<f64>;
/// Weighted storage at half the value bytes, for graphs where `f32` precision suffices.
pub type NarrowMatrix = SparseMatrix<f32>;
pub type BooleanMatrix = SparseMatrix<()>;

impl<V: Value> SparseMatrix<V> {

    /// Indices are stored as `u32`, so neither dimension may exceed `u32::MAX + 1`.
    pub fn new(rows: usize, cols: usize) -> Self {
        let max_dimension = u32::max_value() as u64 + 1;
        assert!(rows as u64 <= max_dimension && cols as u64 <= max_dimension,
            "a {}x{} matrix exceeds the u32 index range", rows, cols);

        SparseMatrix {
            by_row: vec![SparseVector::new(); rows],
            by_col: vec![SparseVector::new(); cols],
            nnz: 0,
        }
    }

    pub fn from_triples<I>(rows: usize, cols: usize, triples: I) -> Self
        where I: IntoIterator<Item=(usize, usize, f64)> {

        let mut matrix = SparseMatrix::new(rows, cols);
        for (row, col, value) in triples {
            matrix.set(row, col, value);
        }
        matrix
    }

    fn check_bounds(&self, row: usize, col: usize) {
        assert!(row < self.by_row.len() && col < self.by_col.len(),
            "index ({}, {}) out of range for {}x{} matrix", row, col, self.by_row.len(),
            self.by_col.len());
    }
}

impl<V: Value> Matrix for SparseMatrix<V> {

    fn rows(&self) -> usize {
        self.by_row.len()
    }

    fn cols(&self) -> usize {
        self.by_col.len()
    }

    fn nnz(&self) -> usize {
        self.nnz
    }

    fn get(&self, row: usize, col: usize) -> f64 {
        self.check_bounds(row, col);

        let row_vector = &self.by_row[row];
        let col_vector = &self.by_col[col];

        // Search the shorter of both mirrors
        if row_vector.len() <= col_vector.len() {
            row_vector.get(col)
        } else {
            col_vector.get(row)
        }
    }

    fn set(&mut self, row: usize, col: usize, value: f64) {
        self.check_bounds(row, col);

        let inserted = self.by_row[row].set(col, value);
        let mirrored = self.by_col[col].set(row, value);
        debug_assert_eq!(inserted, mirrored);

        if inserted {
            self.nnz += 1;
        }
    }

    fn row<'a>(&'a self, row: usize) -> Entries<'a> {
        Box::new(self.by_row[row].iter())
    }

    fn col<'a>(&'a self, col: usize) -> Entries<'a> {
        Box::new(self.by_col[col].iter())
    }

    fn all<'a>(&'a self) -> Triples<'a> {
        Box::new(self.by_row.iter()
            .enumerate()
            .flat_map(|(row, entries)| entries.iter().map(move |(col, value)| (row, col, value))))
    }

    fn row_count(&self, row: usize) -> usize {
        self.by_row[row].len()
    }

    fn col_count(&self, col: usize) -> usize {
        self.by_col[col].len()
    }

    fn mult(&self, v: &[f64], weight: f64, out: &mut [f64]) {
        assert_eq!(v.len(), self.cols(), "vector length does not match matrix columns");
        assert_eq!(out.len(), self.rows(), "output length does not match matrix rows");

        for (row, entries) in self.by_row.iter().enumerate() {
            if !entries.is_empty() {
                out[row] += weight * entries.dot(v);
            }
        }
    }

    fn mult_transpose(&self, v: &[f64], weight: f64, out: &mut [f64]) {
        assert_eq!(v.len(), self.rows(), "vector length does not match matrix rows");
        assert_eq!(out.len(), self.cols(), "output length does not match matrix columns");

        for (col, entries) in self.by_col.iter().enumerate() {
            if !entries.is_empty() {
                out[col] += weight * entries.dot(v);
            }
        }
    }
}

/// A matrix with zero rows or zero columns. Every operation is a no-op.
#[derive(Clone, Copy, Debug)]
pub struct ZeroMatrix {
    rows: usize,
    cols: usize,
}

impl ZeroMatrix {
    pub fn new(rows: usize, cols: usize) -> Self {
        assert!(rows == 0 || cols == 0, "a {}x{} matrix is not degenerate", rows, cols);
        ZeroMatrix { rows, cols }
    }
}

impl Matrix for ZeroMatrix {

    fn rows(&self) -> usize { self.rows }

    fn cols(&self) -> usize { self.cols }

    fn nnz(&self) -> usize { 0 }

    fn get(&self, row: usize, col: usize) -> f64 {
        panic!("index ({}, {}) out of range for {}x{} matrix", row, col, self.rows, self.cols)
    }

    fn set(&mut self, row: usize, col: usize, _value: f64) {
        panic!("index ({}, {}) out of range for {}x{} matrix", row, col, self.rows, self.cols)
    }

    fn row<'a>(&'a self, row: usize) -> Entries<'a> {
        assert!(row < self.rows, "row {} out of range", row);
        Box::new(iter::empty())
    }

    fn col<'a>(&'a self, col: usize) -> Entries<'a> {
        assert!(col < self.cols, "column {} out of range", col);
        Box::new(iter::empty())
    }

    fn all<'a>(&'a self) -> Triples<'a> {
        Box::new(iter::empty())
    }

    fn row_count(&self, _row: usize) -> usize { 0 }

    fn col_count(&self, _col: usize) -> usize { 0 }

    fn mult(&self, _v: &[f64], _weight: f64, _out: &mut [f64]) {}

    fn mult_transpose(&self, _v: &[f64], _weight: f64, _out: &mut [f64]) {}

    fn is_symmetric(&self) -> bool {
        self.rows == self.cols
    }
}

/// Creates the storage matching a relationship's weight range.
pub fn new_matrix(rows: usize, cols: usize, weight_range: WeightRange) -> SharedMatrix {
    if rows == 0 || cols == 0 {
        return share(ZeroMatrix::new(rows, cols));
    }

    match weight_range {
        WeightRange::Unweighted => share(BooleanMatrix::new(rows, cols)),
        WeightRange::Positive | WeightRange::Signed | WeightRange::Weighted =>
            share(WeightedMatrix::new(rows, cols)),
    }
}

pub fn share<M: Matrix + 'static>(matrix: M) -> SharedMatrix {
    Rc::new(RefCell::new(matrix))
}
