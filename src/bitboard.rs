//! A bitboard covering the 10×10 grid, one bit per [`Coord`].
//!
//! The backing integer `T` must hold at least `BOARD_SIZE * BOARD_SIZE` bits;
//! the engine uses `u128`. Indexing goes through `Coord`, which is always in
//! bounds, so reads and writes cannot fail.

use core::fmt;
use core::mem;
use core::ops::{BitAnd, BitOr, Not};
use num_traits::{PrimInt, Unsigned, Zero};

use crate::common::Coord;
use crate::config::BOARD_SIZE;

const CELLS: usize = BOARD_SIZE as usize * BOARD_SIZE as usize;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitBoard<T>
where
    T: PrimInt + Unsigned + Zero,
{
    bits: T,
}

/// The grid type used throughout the engine.
pub type Grid = BitBoard<u128>;

impl<T> BitBoard<T>
where
    T: PrimInt + Unsigned + Zero,
{
    #[inline]
    fn mask() -> T {
        if CELLS == mem::size_of::<T>() * 8 {
            !T::zero()
        } else {
            (T::one() << CELLS) - T::one()
        }
    }

    /// Empty board. `T` must hold at least `BOARD_SIZE * BOARD_SIZE` bits.
    #[inline]
    pub fn new() -> Self {
        debug_assert!(CELLS <= mem::size_of::<T>() * 8, "backing integer too narrow");
        BitBoard { bits: T::zero() }
    }

    #[inline]
    fn bit(at: Coord) -> T {
        T::one() << at.index()
    }

    #[inline]
    pub fn get(&self, at: Coord) -> bool {
        (self.bits & Self::bit(at)) != T::zero()
    }

    #[inline]
    pub fn set(&mut self, at: Coord) {
        self.bits = self.bits | Self::bit(at);
    }

    #[inline]
    pub fn clear(&mut self, at: Coord) {
        self.bits = self.bits & !Self::bit(at);
    }

    pub fn count_ones(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_zero()
    }

    /// True when every cell of `cells` is set.
    pub fn contains_all<'a, I>(&self, cells: I) -> bool
    where
        I: IntoIterator<Item = &'a Coord>,
    {
        cells.into_iter().all(|&c| self.get(c))
    }

    #[inline]
    pub fn into_raw(self) -> T {
        self.bits
    }

    /// Creates a bitboard from the raw integer, masking out bits beyond the grid.
    #[inline]
    pub fn from_raw(raw: T) -> Self {
        BitBoard {
            bits: raw & Self::mask(),
        }
    }
}

impl<T> Default for BitBoard<T>
where
    T: PrimInt + Unsigned + Zero,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for BitBoard<T>
where
    T: PrimInt + Unsigned + Zero,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BitBoard<{}>:", core::any::type_name::<T>())?;
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                let set = Coord::new(row, col).is_some_and(|c| self.get(c));
                write!(f, "{} ", if set { '■' } else { '□' })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl<T> BitAnd for BitBoard<T>
where
    T: PrimInt + Unsigned + Zero,
{
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        BitBoard::from_raw(self.bits & rhs.bits)
    }
}

impl<T> BitOr for BitBoard<T>
where
    T: PrimInt + Unsigned + Zero,
{
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        BitBoard::from_raw(self.bits | rhs.bits)
    }
}

/// Complement within the grid.
impl<T> Not for BitBoard<T>
where
    T: PrimInt + Unsigned + Zero,
{
    type Output = Self;
    fn not(self) -> Self {
        Self::from_raw(!self.bits)
    }
}
