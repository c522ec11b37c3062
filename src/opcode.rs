//! SPI opcodes understood by the TDC-GPX2.
//!
//! The read and write opcodes carry a register address in their lower bits, e.g. reading the results
//! starting at address 8 is sent as `0x60 + 8`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// Power-on reset, restores the default configuration.
    PowerReset,
    /// Initializes the chip and starts measuring.
    Init,
    /// Writes configuration registers starting at the given address.
    WriteConfig,
    /// Reads configuration registers starting at the given address.
    ReadConfig,
    /// Reads result registers starting at the given address.
    ReadResults,
}

impl Opcode {
    /// Address of the first result register (STOP1 reference index).
    pub const RESULTS_ADDR: u8 = 0x08;

    /// Builds the opcode byte with `address` in the lower bits.
    pub fn with_address(self, address: u8) -> u8 {
        u8::from(self) + address
    }
}

impl From<Opcode> for u8 {
    fn from(opcode: Opcode) -> u8 {
        match opcode {
            Opcode::PowerReset => 0x30,
            Opcode::Init => 0x18,
            Opcode::WriteConfig => 0x80,
            Opcode::ReadConfig => 0x40,
            Opcode::ReadResults => 0x60,
        }
    }
}
