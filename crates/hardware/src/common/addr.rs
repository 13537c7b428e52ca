//! Absolute byte addresses and half-open address ranges.
//!
//! The bus routes every request by address, so these two types carry the ownership
//! rule of the memory map: a device owns exactly the addresses its range `contains`.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// An absolute byte address on the I/O bus.
///
/// Stored as 64 bits so that range arithmetic near the 32-bit ceiling cannot wrap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub u64);

impl Address {
    /// Creates an address from a raw value.
    #[inline(always)]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw address value.
    #[inline(always)]
    pub const fn val(self) -> u64 {
        self.0
    }

    /// Returns the address `offset` bytes further, or `None` on 64-bit overflow.
    pub const fn checked_add(self, offset: u64) -> Option<Self> {
        match self.0.checked_add(offset) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }
}

impl From<u32> for Address {
    fn from(value: u32) -> Self {
        Self(u64::from(value))
    }
}

impl Add<u64> for Address {
    type Output = Self;

    fn add(self, rhs: u64) -> Self {
        Self(self.0.wrapping_add(rhs))
    }
}

impl Sub<u64> for Address {
    type Output = Self;

    fn sub(self, rhs: u64) -> Self {
        Self(self.0.wrapping_sub(rhs))
    }
}

impl Sub for Address {
    type Output = u64;

    /// Distance in bytes between two addresses.
    fn sub(self, rhs: Self) -> u64 {
        self.0.wrapping_sub(rhs.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// A half-open byte range `[base, base + size)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressRange {
    /// First address owned by the range.
    pub base: Address,
    /// Number of bytes in the range.
    pub size: u64,
}

impl AddressRange {
    /// Creates a range starting at `base` spanning `size` bytes.
    pub const fn new(base: Address, size: u64) -> Self {
        Self { base, size }
    }

    /// Returns the first address past the range.
    pub const fn end(&self) -> Address {
        Address(self.base.0 + self.size)
    }

    /// Returns `true` if `addr` lies inside the range.
    pub const fn contains(&self, addr: Address) -> bool {
        addr.0 >= self.base.0 && addr.0 - self.base.0 < self.size
    }

    /// Returns `true` if the two ranges share at least one address.
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.size != 0
            && other.size != 0
            && self.base.0 < other.base.0 + other.size
            && other.base.0 < self.base.0 + self.size
    }

    /// Translates an absolute address into a range-relative offset.
    ///
    /// Returns `None` when the address is outside the range.
    pub const fn offset_of(&self, addr: Address) -> Option<u64> {
        if self.contains(addr) {
            Some(addr.0 - self.base.0)
        } else {
            None
        }
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.base, self.end())
    }
}
