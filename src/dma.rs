//! OAM DMA (Direct Memory Access) functions and structures.
//!
//! Writing to the DMA register starts a transfer of 160 bytes from
//! `source << 8` into OAM (0xFE00-0xFE9F), advancing one byte per
//! T-cycle under the main clock (see [`crate::mmu::Mmu::clock_dma`]).

use std::fmt::{self, Display, Formatter};

use crate::{consts::DMA_ADDR, mmu::BusComponent, warnln};

/// Number of bytes copied by a single OAM DMA transfer.
pub const DMA_LENGTH: u8 = 160;

pub struct Dma {
    /// High byte of the source address, as written to the DMA register.
    /// The transfer always reads from `source << 8`.
    source_high: u8,

    /// Whether a transfer is currently in progress.
    active: bool,

    /// Byte offset (0..DMA_LENGTH) of the next byte to be copied.
    offset: u8,
}

impl Dma {
    pub fn new() -> Self {
        Self {
            source_high: 0x0,
            active: false,
            offset: 0,
        }
    }

    pub fn reset(&mut self) {
        self.source_high = 0x0;
        self.active = false;
        self.offset = 0;
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            // 0xFF46 — DMA: OAM DMA source address & start
            DMA_ADDR => self.source_high,
            _ => {
                warnln!("Reading from unknown DMA location 0x{:04x}", addr);
                #[allow(unreachable_code)]
                0xff
            }
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            // 0xFF46 — DMA: OAM DMA source address & start, restarting
            // a write right after a previous one simply re-arms the
            // transfer from the new source
            DMA_ADDR => {
                self.source_high = value;
                self.active = true;
                self.offset = 0;
            }
            _ => warnln!("Writing to unknown DMA location 0x{:04x}", addr),
        }
    }

    #[inline(always)]
    pub fn source(&self) -> u16 {
        (self.source_high as u16) << 8
    }

    #[inline(always)]
    pub fn active(&self) -> bool {
        self.active
    }

    #[inline(always)]
    pub fn offset(&self) -> u8 {
        self.offset
    }

    /// Advances the transfer by a single byte, returning the
    /// `(source, destination)` addresses involved, or `None` if no
    /// transfer is in progress. Destination addresses are always
    /// within OAM (0xFE00-0xFE9F).
    pub fn tick(&mut self) -> Option<(u16, u16)> {
        if !self.active {
            return None;
        }

        let offset = self.offset;
        let source = self.source() + offset as u16;
        let destination = 0xfe00 + offset as u16;

        self.offset = self.offset.wrapping_add(1);
        if self.offset >= DMA_LENGTH {
            self.active = false;
        }

        Some((source, destination))
    }

    pub fn description(&self) -> String {
        format!(
            "active: {}, offset: {}, source: 0x{:04x}",
            self.active,
            self.offset,
            self.source()
        )
    }
}

impl BusComponent for Dma {
    fn read(&self, addr: u16) -> u8 {
        self.read(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.write(addr, value);
    }
}

impl Default for Dma {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Dma {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::Dma;

    #[test]
    fn test_dma_default() {
        let dma = Dma::default();
        assert!(!dma.active());
        assert_eq!(dma.offset(), 0);
    }

    #[test]
    fn test_dma_reset() {
        let mut dma = Dma::new();
        dma.write(0xff46, 0xc0);
        dma.reset();
        assert!(!dma.active());
        assert_eq!(dma.offset(), 0);
        assert_eq!(dma.source(), 0x0);
    }

    #[test]
    fn test_dma_write_starts_transfer() {
        let mut dma = Dma::new();
        dma.write(0xff46, 0xc0);
        assert!(dma.active());
        assert_eq!(dma.source(), 0xc000);
        assert_eq!(dma.offset(), 0);
    }

    #[test]
    fn test_dma_tick_advances_incrementally() {
        let mut dma = Dma::new();
        dma.write(0xff46, 0xc0);

        let (source, destination) = dma.tick().unwrap();
        assert_eq!(source, 0xc000);
        assert_eq!(destination, 0xfe00);
        assert!(dma.active());

        let (source, destination) = dma.tick().unwrap();
        assert_eq!(source, 0xc001);
        assert_eq!(destination, 0xfe01);
    }

    #[test]
    fn test_dma_finishes_after_160_bytes() {
        let mut dma = Dma::new();
        dma.write(0xff46, 0xc0);

        for _ in 0..159 {
            assert!(dma.tick().is_some());
            assert!(dma.active());
        }

        // the 160th byte completes the transfer
        assert!(dma.tick().is_some());
        assert!(!dma.active());
        assert!(dma.tick().is_none());
    }
}
