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

use std::fmt::Debug;

/// The payload stored for every explicit entry of a sparse vector.
///
/// Memory usage of a graph is dominated by the per-edge index and value bytes, so besides
/// `f64` we also store narrow `f32` weights, and `()` for unweighted edges. `Vec<()>` never
/// allocates, which means a boolean vector only pays for its indices.
pub trait Value: Copy + Debug + 'static {
    fn from_f64(value: f64) -> Self;
    fn to_f64(self) -> f64;
    /// Whether writing `value` must create an entry. Boolean vectors only store edges.
    fn is_stored(value: f64) -> bool;
}

impl Value for f64 {
    #[inline(always)]
    fn from_f64(value: f64) -> Self { value }
    #[inline(always)]
    fn to_f64(self) -> f64 { self }
    #[inline(always)]
    fn is_stored(_value: f64) -> bool { true }
}

impl Value for f32 {
    #[inline(always)]
    fn from_f64(value: f64) -> Self { value as f32 }
    #[inline(always)]
    fn to_f64(self) -> f64 { self as f64 }
    #[inline(always)]
    fn is_stored(_value: f64) -> bool { true }
}

impl Value for () {
    #[inline(always)]
    fn from_f64(_value: f64) -> Self {}
    #[inline(always)]
    fn to_f64(self) -> f64 { 1.0 }
    #[inline(always)]
    fn is_stored(value: f64) -> bool { value != 0.0 }
}

/// Sorted, duplicate-free indices with a parallel value buffer.
///
/// Point lookups are a binary search, inserts shift the tail, appends at the end are
/// amortized O(1). Capacity grows by roughly 10% when full and is never released.
#[derive(Clone, Debug)]
pub struct SparseVector<V: Value> {
    indices: Vec<u32>,
    values: Vec<V>,
}

impl<V: Value> Default for SparseVector<V> {
    fn default() -> Self {
        SparseVector::new()
    }
}

impl<V: Value> SparseVector<V> {

    pub fn new() -> Self {
        SparseVector { indices: Vec::new(), values: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        SparseVector { indices: Vec::with_capacity(capacity), values: Vec::with_capacity(capacity) }
    }

    /// Number of explicit entries.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    fn position(&self, index: usize) -> Result<usize, usize> {
        self.indices.binary_search(&(index as u32))
    }

    pub fn get(&self, index: usize) -> f64 {
        match self.position(index) {
            Ok(position) => self.values[position].to_f64(),
            Err(_) => 0.0,
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.position(index).is_ok()
    }

    /// Insert-or-overwrite. Returns true if a new entry was created.
    pub fn set(&mut self, index: usize, value: f64) -> bool {
        assert!(index as u64 <= u32::max_value() as u64, "index {} exceeds u32", index);

        match self.position(index) {
            Ok(position) => {
                self.values[position] = V::from_f64(value);
                false
            },
            Err(position) => {
                if !V::is_stored(value) {
                    return false;
                }
                self.grow_if_full();
                self.indices.insert(position, index as u32);
                self.values.insert(position, V::from_f64(value));
                true
            }
        }
    }

    fn grow_if_full(&mut self) {
        let capacity = self.indices.capacity();
        if self.indices.len() == capacity {
            let additional = capacity / 10 + 4;
            self.indices.reserve_exact(additional);
            self.values.reserve_exact(additional);
        }
    }

    /// Explicit entries in increasing index order.
    pub fn iter<'a>(&'a self) -> impl Iterator<Item=(usize, f64)> + 'a {
        self.indices.iter()
            .zip(self.values.iter())
            .map(|(index, value)| (*index as usize, value.to_f64()))
    }

    /// Explicit indices in increasing order.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Σ value·dense[index] over the explicit entries.
    pub fn dot(&self, dense: &[f64]) -> f64 {
        self.iter().map(|(index, value)| value * dense[index]).sum()
    }
}
