//! Device backing store.
//!
//! A fixed-size, zero-initialised byte array. Exactly one owner at a time: the
//! device while powered off, its worker while powered on.

/// Fixed-capacity byte storage of a memory device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryBuffer {
    bytes: Vec<u8>,
}

impl MemoryBuffer {
    /// Creates a zeroed buffer of `size` bytes.
    ///
    /// # Arguments
    ///
    /// * `size` - Size of the buffer in bytes.
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size],
        }
    }

    /// Returns the size of the buffer in bytes.
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` for a zero-sized buffer.
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Reads one byte; `None` past the end.
    pub fn byte(&self, offset: u64) -> Option<u8> {
        usize::try_from(offset)
            .ok()
            .and_then(|i| self.bytes.get(i).copied())
    }

    /// Stores one byte; returns `false` past the end.
    pub fn set_byte(&mut self, offset: u64, value: u8) -> bool {
        match usize::try_from(offset).ok().and_then(|i| self.bytes.get_mut(i)) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Borrows `len` bytes starting at `offset`; `None` if any byte is past the end.
    pub fn slice(&self, offset: u64, len: usize) -> Option<&[u8]> {
        let start = usize::try_from(offset).ok()?;
        let end = start.checked_add(len)?;
        self.bytes.get(start..end)
    }

    /// Copies `data` in at `offset`; returns `false` and writes nothing if it does not fit.
    pub fn write_slice(&mut self, offset: u64, data: &[u8]) -> bool {
        let Some(start) = usize::try_from(offset).ok() else {
            return false;
        };
        let Some(end) = start.checked_add(data.len()) else {
            return false;
        };
        match self.bytes.get_mut(start..end) {
            Some(dst) => {
                dst.copy_from_slice(data);
                true
            }
            None => false,
        }
    }
}
