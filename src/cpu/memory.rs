//! Machine memory.
//!
//! 4096 bytes laid out as:
//! - `0x000..` the font glyph table (80 bytes for the built-in font)
//! - zero padding up to `0x200`
//! - the program image from `0x200`
//! - zero padding up to `0x1000`

use thiserror::Error;

/// Total addressable memory in bytes.
pub const MEMORY_SIZE: usize = 0x1000;

/// Where the program image is loaded, and the initial program counter.
pub const PROGRAM_START: usize = 0x200;

/// Largest program image that fits between `PROGRAM_START` and the top of memory.
pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - PROGRAM_START;

/// Bytes per font glyph. Glyph `g` lives at `g * GLYPH_SIZE`.
pub const GLYPH_SIZE: usize = 5;

/// Built-in hexadecimal font, glyphs 0-F.
pub const FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// 4KB of byte-addressed memory.
#[derive(Clone, PartialEq, Eq)]
pub struct Memory {
    bytes: Box<[u8; MEMORY_SIZE]>,
}

impl Memory {
    /// Build the initial memory image from a font table and a program.
    ///
    /// Fails without creating anything if either part does not fit its region.
    pub fn with_image(font: &[u8], program: &[u8]) -> Result<Self, ConstructionError> {
        if font.len() > PROGRAM_START {
            return Err(ConstructionError::FontTooLarge { size: font.len() });
        }
        if program.len() > MAX_PROGRAM_SIZE {
            return Err(ConstructionError::ProgramTooLarge {
                size: program.len(),
                available: MAX_PROGRAM_SIZE,
            });
        }

        let mut bytes = Box::new([0u8; MEMORY_SIZE]);
        bytes[..font.len()].copy_from_slice(font);
        bytes[PROGRAM_START..PROGRAM_START + program.len()].copy_from_slice(program);
        Ok(Self { bytes })
    }

    /// Read one byte.
    #[inline]
    pub fn read(&self, addr: usize) -> Result<u8, MemoryError> {
        self.bytes
            .get(addr)
            .copied()
            .ok_or(MemoryError::AddressOverflow { address: addr })
    }

    /// Write one byte.
    #[inline]
    pub fn write(&mut self, addr: usize, value: u8) -> Result<(), MemoryError> {
        let cell = self
            .bytes
            .get_mut(addr)
            .ok_or(MemoryError::AddressOverflow { address: addr })?;
        *cell = value;
        Ok(())
    }

    /// Check that `len` bytes starting at `start` are all addressable.
    ///
    /// Multi-byte instructions call this before their first write.
    pub fn check_range(start: usize, len: usize) -> Result<(), MemoryError> {
        if start > MEMORY_SIZE || start + len > MEMORY_SIZE {
            return Err(MemoryError::AddressOverflow {
                address: start.max(MEMORY_SIZE),
            });
        }
        Ok(())
    }

    /// Borrow `len` bytes starting at `start`.
    pub fn slice(&self, start: usize, len: usize) -> Result<&[u8], MemoryError> {
        Self::check_range(start, len)?;
        Ok(&self.bytes[start..start + len])
    }

    /// The whole address space.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..]
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.bytes.iter().filter(|b| **b != 0).count();
        f.debug_struct("Memory")
            .field("non_zero_bytes", &non_zero)
            .field("total_bytes", &MEMORY_SIZE)
            .finish()
    }
}

/// Errors from runtime memory accesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("address {address:#05x} is outside memory (0x000-0xfff)")]
    AddressOverflow { address: usize },
}

/// Errors from building the initial machine image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },

    #[error("font table of {size} bytes overlaps the program area at 0x200")]
    FontTooLarge { size: usize },
}
