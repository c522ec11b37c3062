use crate::acquisition::{Command, Operator};
use crate::bus::Bus;
use crate::gpx2::RESULT_LEN;
use crate::image::{RegisterImage, DEFAULT_CONFIG};
use crate::opcode::Opcode;
use crate::register::CONFIG_LEN;
use core::convert::Infallible;
use embedded_hal::digital::{ErrorType, InputPin};
use embedded_hal_async::delay::DelayNs;

const OPCODE_LOG: usize = 128;

/// Emulates the TDC-GPX2 behind a [`Bus`]: a register file that can be written and read back, and a
/// fixed set of result bytes.
pub struct FakeChip {
    pub registers: [u8; CONFIG_LEN],
    results: [u8; RESULT_LEN],
    /// First byte of every frame, in order.
    pub opcodes: heapless::Vec<u8, OPCODE_LOG>,
    /// Length of every frame, in order.
    pub frame_lengths: heapless::Vec<usize, OPCODE_LOG>,
    clean_readbacks: usize,
    corrupt_readbacks: usize,
    fail_next: bool,
}

impl FakeChip {
    pub fn new() -> Self {
        FakeChip {
            registers: DEFAULT_CONFIG,
            results: [0u8; RESULT_LEN],
            opcodes: heapless::Vec::new(),
            frame_lengths: heapless::Vec::new(),
            clean_readbacks: 0,
            corrupt_readbacks: 0,
            fail_next: false,
        }
    }

    pub fn with_results(&mut self, results: &[u8; RESULT_LEN]) {
        self.results = *results;
    }

    /// The next `count` configuration reads return a flipped bit in register 1.
    pub fn corrupt_readbacks(&mut self, count: usize) {
        self.corrupt_readbacks_after(0, count);
    }

    /// Like [`FakeChip::corrupt_readbacks`], but the first `clean` configuration reads are left intact.
    pub fn corrupt_readbacks_after(&mut self, clean: usize, count: usize) {
        self.clean_readbacks = clean;
        self.corrupt_readbacks = count;
    }

    /// The next exchange fails without touching the chip.
    pub fn fail_next_exchange(&mut self) {
        self.fail_next = true;
    }

    /// Number of frames that started with `opcode`.
    pub fn count(&self, opcode: u8) -> usize {
        self.opcodes.iter().filter(|&&op| op == opcode).count()
    }
}

impl Bus for FakeChip {
    type Error = ();

    async fn exchange(&mut self, frame: &mut [u8]) -> Result<(), Self::Error> {
        if self.fail_next {
            self.fail_next = false;
            return Err(());
        }

        let opcode = frame[0];
        self.opcodes.push(opcode).unwrap();
        self.frame_lengths.push(frame.len()).unwrap();
        frame[0] = 0;

        let write_config = u8::from(Opcode::WriteConfig);
        let read_config = u8::from(Opcode::ReadConfig);
        let read_results = u8::from(Opcode::ReadResults);

        if opcode == u8::from(Opcode::PowerReset) {
            self.registers = DEFAULT_CONFIG;
        } else if opcode == u8::from(Opcode::Init) {
            // Nothing to emulate, measurement just starts.
        } else if opcode & 0xE0 == write_config {
            let start = (opcode - write_config) as usize;
            for (i, byte) in frame[1..].iter_mut().enumerate() {
                self.registers[start + i] = *byte;
                *byte = 0;
            }
        } else if opcode & 0xE0 == read_config {
            let start = (opcode - read_config) as usize;
            for (i, byte) in frame[1..].iter_mut().enumerate() {
                *byte = self.registers[start + i];
            }
            if self.clean_readbacks > 0 {
                self.clean_readbacks -= 1;
            } else if self.corrupt_readbacks > 0 {
                self.corrupt_readbacks -= 1;
                frame[2] ^= 0x01;
            }
        } else if opcode & 0xE0 == read_results {
            let start = (opcode - read_results - Opcode::RESULTS_ADDR) as usize;
            for (i, byte) in frame[1..].iter_mut().enumerate() {
                *byte = self.results[start + i];
            }
        } else {
            panic!("Unexpected opcode 0x{:02X}", opcode)
        }

        Ok(())
    }
}

/// Interrupt pin that reads high for a number of polls, then low.
pub struct FakeIntPin {
    high_polls: u32,
    pub polls: u32,
}

impl FakeIntPin {
    pub fn low() -> Self {
        Self::high_for(0)
    }

    pub fn high_for(high_polls: u32) -> Self {
        FakeIntPin { high_polls, polls: 0 }
    }
}

impl ErrorType for FakeIntPin {
    type Error = Infallible;
}

impl InputPin for FakeIntPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.polls += 1;
        if self.high_polls > 0 {
            self.high_polls -= 1;
            return Ok(true);
        }

        Ok(false)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

pub struct FakeDelay {
    pub total_ns: u64,
}

impl FakeDelay {
    pub fn new() -> Self {
        FakeDelay { total_ns: 0 }
    }
}

impl DelayNs for FakeDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }
}

/// Operator that applies a fixed list of edits and then issues a fixed list of commands.
///
/// Once the commands run out it keeps answering with [`Command::Restart`] so the loop always ends.
pub struct ScriptedOperator<'a> {
    edits: &'a [fn(&mut RegisterImage)],
    commands: &'a [Option<Command>],
    pub configure_calls: usize,
    pub command_polls: usize,
}

impl<'a> ScriptedOperator<'a> {
    pub fn new(edits: &'a [fn(&mut RegisterImage)], commands: &'a [Option<Command>]) -> Self {
        ScriptedOperator { edits, commands, configure_calls: 0, command_polls: 0 }
    }
}

impl Operator for ScriptedOperator<'_> {
    fn configure(&mut self, image: &mut RegisterImage) {
        if let Some(edit) = self.edits.get(self.configure_calls) {
            edit(image);
        }
        self.configure_calls += 1;
    }

    fn poll_command(&mut self) -> Option<Command> {
        let command = self.commands.get(self.command_polls).copied().unwrap_or(Some(Command::Restart));
        self.command_polls += 1;
        command
    }
}
