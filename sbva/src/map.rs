/*****************************************************************************************[map.rs]
Copyright (c) 2023-2024, Andrew Haberlandt, Harrison Green, Marijn J.H. Heule (SBVA)

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

//! Dense per-literal and per-variable tables.
//!
//! Literal and variable indices are small and contiguous, so every table
//! this crate keeps (occurrence lists, count adjustments, adjacency rows)
//! is a plain vector grown on demand, indexed by [`Lit`] or [`Var`]
//! directly.

use crate::clause::{Lit, Var};
use bit_vec::BitVec;
use std::ops;

/// One slot per literal: both polarities of every allocated variable.
#[derive(Debug, Clone, Default)]
pub struct LitMap<V> {
    slots: Vec<V>,
}

impl<V: Default> LitMap<V> {
    pub fn new() -> Self {
        LitMap { slots: Vec::new() }
    }

    /// Extend the table so both literals of the first `num_vars` variables
    /// have a slot. Never shrinks.
    pub fn grow_to(&mut self, num_vars: u32) {
        let want = 2 * num_vars as usize;
        if want > self.slots.len() {
            self.slots.resize_with(want, V::default);
        }
    }
}

impl<V> ops::Index<Lit> for LitMap<V> {
    type Output = V;
    #[inline]
    fn index(&self, l: Lit) -> &V {
        &self.slots[l.idx() as usize]
    }
}

impl<V> ops::IndexMut<Lit> for LitMap<V> {
    #[inline]
    fn index_mut(&mut self, l: Lit) -> &mut V {
        &mut self.slots[l.idx() as usize]
    }
}

/// One slot per variable.
#[derive(Debug, Clone, Default)]
pub struct VarMap<V> {
    slots: Vec<V>,
}

impl<V: Default> VarMap<V> {
    pub fn new() -> Self {
        VarMap { slots: Vec::new() }
    }

    /// Extend the table to `num_vars` slots. Never shrinks.
    pub fn grow_to(&mut self, num_vars: u32) {
        let want = num_vars as usize;
        if want > self.slots.len() {
            self.slots.resize_with(want, V::default);
        }
    }

    /// Drop every slot; a following `grow_to` refills with defaults.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

impl<V> ops::Index<Var> for VarMap<V> {
    type Output = V;
    #[inline]
    fn index(&self, v: Var) -> &V {
        &self.slots[v.idx() as usize]
    }
}

impl<V> ops::IndexMut<Var> for VarMap<V> {
    #[inline]
    fn index_mut(&mut self, v: Var) -> &mut V {
        &mut self.slots[v.idx() as usize]
    }
}

/// A set of literals that remembers insertion order, so a round of
/// updates replays deterministically.
#[derive(Debug, Clone, Default)]
pub struct LitSet {
    member: BitVec,
    order: Vec<Lit>,
}

impl LitSet {
    pub fn new() -> Self {
        LitSet::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn insert(&mut self, l: Lit) {
        let i = l.idx() as usize;
        if i >= self.member.len() {
            self.member.grow(i + 1 - self.member.len(), false);
        }
        if !self.member[i] {
            self.member.set(i, true);
            self.order.push(l);
        }
    }

    pub fn clear(&mut self) {
        self.member.clear();
        self.order.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = Lit> + '_ {
        self.order.iter().copied()
    }
}
