// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Machine occupancy as a growable bit vector.
//!
//! Bit `i` is set when machine `i` is busy. Words beyond the end of the vector
//! are implicitly zero, so sets of different lengths compare and combine as if
//! padded with free machines.

use dose_alloc_model::id::MachineId;
use std::{
    fmt::Display,
    hash::{Hash, Hasher},
};

const WORD_BITS: usize = u64::BITS as usize;

#[derive(Debug, Clone, Default)]
pub struct OccupancySet {
    words: Vec<u64>,
}

impl OccupancySet {
    #[inline]
    pub fn new() -> Self {
        Self { words: Vec::new() }
    }

    #[inline]
    fn word(&self, index: usize) -> u64 {
        self.words.get(index).copied().unwrap_or(0)
    }

    /// Length of the vector without trailing zero words.
    #[inline]
    fn significant_len(&self) -> usize {
        self.words
            .iter()
            .rposition(|&w| w != 0)
            .map_or(0, |i| i + 1)
    }

    #[inline]
    fn lowest_in(index: usize, word: u64) -> MachineId {
        MachineId::new(index * WORD_BITS + word.trailing_zeros() as usize)
    }

    #[inline]
    pub fn contains(&self, machine: MachineId) -> bool {
        let i = machine.value();
        self.word(i / WORD_BITS) & (1 << (i % WORD_BITS)) != 0
    }

    /// Marks `machine` busy. Returns `false` if it already was.
    #[inline]
    pub fn insert(&mut self, machine: MachineId) -> bool {
        let i = machine.value();
        let index = i / WORD_BITS;
        if index >= self.words.len() {
            self.words.resize(index + 1, 0);
        }
        let mask = 1 << (i % WORD_BITS);
        let fresh = self.words[index] & mask == 0;
        self.words[index] |= mask;
        fresh
    }

    /// Marks `machine` free. Returns `false` if it already was.
    #[inline]
    pub fn remove(&mut self, machine: MachineId) -> bool {
        let i = machine.value();
        let Some(word) = self.words.get_mut(i / WORD_BITS) else {
            return false;
        };
        let mask = 1 << (i % WORD_BITS);
        let present = *word & mask != 0;
        *word &= !mask;
        present
    }

    /// Number of busy machines.
    #[inline]
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// The smallest machine id that is not busy.
    ///
    /// ```
    /// use dose_alloc_model::id::MachineId;
    /// use dose_alloc_solver::occupancy::OccupancySet;
    ///
    /// let mut set: OccupancySet = [0, 1, 3].into_iter().map(MachineId::new).collect();
    /// assert_eq!(set.first_not_contained(), MachineId::new(2));
    /// set.insert(MachineId::new(2));
    /// assert_eq!(set.first_not_contained(), MachineId::new(4));
    /// ```
    pub fn first_not_contained(&self) -> MachineId {
        self.words
            .iter()
            .enumerate()
            .find(|&(_, &w)| w != u64::MAX)
            .map_or_else(
                || MachineId::new(self.words.len() * WORD_BITS),
                |(i, &w)| Self::lowest_in(i, !w),
            )
    }

    /// The lowest machine busy in both `left` and `right` but free in `self`.
    ///
    /// A range whose two neighbours hold the same machine is a gap that the
    /// machine could fill exactly.
    pub fn unique_in_both_neighbours(
        &self,
        left: &OccupancySet,
        right: &OccupancySet,
    ) -> Option<MachineId> {
        let len = left.words.len().min(right.words.len());
        (0..len).find_map(|i| {
            let w = left.words[i] & right.words[i] & !self.word(i);
            (w != 0).then(|| Self::lowest_in(i, w))
        })
    }

    /// The lowest machine busy in `other` but free in `self`.
    pub fn unique_in_other(&self, other: &OccupancySet) -> Option<MachineId> {
        other.words.iter().enumerate().find_map(|(i, &o)| {
            let w = o & !self.word(i);
            (w != 0).then(|| Self::lowest_in(i, w))
        })
    }

    /// Returns `true` if every machine below `count` is busy.
    #[inline]
    pub fn covers_first(&self, count: usize) -> bool {
        self.first_not_contained().value() >= count
    }

    pub fn union(&self, other: &OccupancySet) -> OccupancySet {
        let len = self.words.len().max(other.words.len());
        let words = (0..len).map(|i| self.word(i) | other.word(i)).collect();
        OccupancySet { words }
    }

    pub fn difference(&self, other: &OccupancySet) -> OccupancySet {
        let words = (0..self.words.len())
            .map(|i| self.words[i] & !other.word(i))
            .collect();
        OccupancySet { words }
    }

    /// Busy machines in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = MachineId> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &w)| {
            let mut rest = w;
            std::iter::from_fn(move || {
                if rest == 0 {
                    return None;
                }
                let bit = rest.trailing_zeros() as usize;
                rest &= rest - 1;
                Some(MachineId::new(i * WORD_BITS + bit))
            })
        })
    }
}

impl PartialEq for OccupancySet {
    fn eq(&self, other: &Self) -> bool {
        let len = self.significant_len();
        len == other.significant_len() && self.words[..len] == other.words[..len]
    }
}

impl Eq for OccupancySet {}

impl Hash for OccupancySet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.words[..self.significant_len()].hash(state);
    }
}

impl FromIterator<MachineId> for OccupancySet {
    fn from_iter<I: IntoIterator<Item = MachineId>>(iter: I) -> Self {
        let mut set = OccupancySet::new();
        set.extend(iter);
        set
    }
}

impl Extend<MachineId> for OccupancySet {
    fn extend<I: IntoIterator<Item = MachineId>>(&mut self, iter: I) {
        for machine in iter {
            self.insert(machine);
        }
    }
}

impl Display for OccupancySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (n, machine) in self.iter().enumerate() {
            if n > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", machine.value())?;
        }
        write!(f, "}}")
    }
}
