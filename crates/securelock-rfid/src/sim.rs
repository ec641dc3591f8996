//! Register-level simulation of an MFRC522 with one ISO 14443A card.
//!
//! [`SimulatedMfrc522`] decodes the serial byte stream exactly like the
//! chip does, keeps a register file and a FIFO, and answers transceive
//! commands on behalf of the card in its field. A [`SimulatedMfrc522Handle`]
//! moves cards in and out of the field and injects faults.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use securelock_core::CardUid;
use securelock_hardware::{HardwareError, ReaderTransport};

use crate::registers::{
    ANTENNA_ON, ChipCommand, FIFO_SIZE, FLUSH_BUFFER, Register, START_SEND, irq, picc,
};

/// Value of the version register on a genuine MFRC522 v2.0.
pub const SIMULATED_VERSION: u8 = 0x92;

/// ATQA of a MIFARE Classic 1K.
const ATQA: [u8; 2] = [0x04, 0x00];

const REGISTER_COUNT: usize = 0x40;

#[derive(Debug, Clone, Copy)]
enum Phase {
    Address,
    Read(u8),
    Write(u8),
}

#[derive(Debug, Clone, Copy)]
struct Card {
    uid: CardUid,
    halted: bool,
}

#[derive(Debug)]
struct ChipState {
    registers: [u8; REGISTER_COUNT],
    fifo: VecDeque<u8>,
    phase: Phase,
    selected: bool,
    in_reset: bool,
    card: Option<Card>,

    bus_fault: bool,
    stalled: bool,
    error_status: u8,
    reply_limit: Option<usize>,

    selects: u64,
    deselects: u64,
    hardware_resets: u64,
    frames: Vec<Vec<u8>>,
}

impl ChipState {
    fn new() -> Self {
        let mut state = Self {
            registers: [0; REGISTER_COUNT],
            fifo: VecDeque::with_capacity(FIFO_SIZE),
            phase: Phase::Address,
            selected: false,
            in_reset: false,
            card: None,
            bus_fault: false,
            stalled: false,
            error_status: 0,
            reply_limit: None,
            selects: 0,
            deselects: 0,
            hardware_resets: 0,
            frames: Vec::new(),
        };
        state.power_on();
        state
    }

    fn power_on(&mut self) {
        self.registers = [0; REGISTER_COUNT];
        self.registers[usize::from(Register::TxControl.addr())] = 0x80;
        self.registers[usize::from(Register::Version.addr())] = SIMULATED_VERSION;
        self.fifo.clear();
    }

    fn reg(&self, reg: Register) -> u8 {
        self.registers[usize::from(reg.addr())]
    }

    fn set_reg(&mut self, reg: Register, value: u8) {
        self.registers[usize::from(reg.addr())] = value;
    }

    fn read(&mut self, addr: u8) -> u8 {
        match addr {
            a if a == Register::FifoData.addr() => self.fifo.pop_front().unwrap_or(0),
            a if a == Register::FifoLevel.addr() => self.fifo.len() as u8,
            a => self.registers[usize::from(a)],
        }
    }

    fn write(&mut self, addr: u8, value: u8) {
        match addr {
            a if a == Register::Command.addr() => {
                self.registers[usize::from(a)] = value & 0x0F;
                if ChipCommand::from_bits(value) == Some(ChipCommand::SoftReset) {
                    self.power_on();
                }
            }
            a if a == Register::ComIrq.addr() => {
                let bits = value & irq::ALL;
                let current = self.registers[usize::from(a)];
                self.registers[usize::from(a)] = if value & irq::SET1 != 0 {
                    current | bits
                } else {
                    current & !bits
                };
            }
            a if a == Register::FifoLevel.addr() => {
                if value & FLUSH_BUFFER != 0 {
                    self.fifo.clear();
                }
            }
            a if a == Register::FifoData.addr() => {
                if self.fifo.len() < FIFO_SIZE {
                    self.fifo.push_back(value);
                }
            }
            a if a == Register::Error.addr() || a == Register::Version.addr() => {}
            a if a == Register::BitFraming.addr() => {
                self.registers[usize::from(a)] = value;
                let transceiving =
                    ChipCommand::from_bits(self.reg(Register::Command))
                        == Some(ChipCommand::Transceive);
                if value & START_SEND != 0 && transceiving {
                    self.transceive();
                }
            }
            a => self.registers[usize::from(a)] = value,
        }
    }

    fn transceive(&mut self) {
        let frame: Vec<u8> = self.fifo.drain(..).collect();
        let last_bits = self.reg(Register::BitFraming) & 0x07;
        self.set_reg(Register::Error, 0);
        self.frames.push(frame.clone());

        if self.stalled {
            return;
        }

        let antenna_on = self.reg(Register::TxControl) & ANTENNA_ON == ANTENNA_ON;
        let reply = if antenna_on {
            self.card_reply(&frame, last_bits)
        } else {
            None
        };

        let Some(mut reply) = reply else {
            self.raise(irq::TIMER);
            return;
        };

        if let Some(limit) = self.reply_limit {
            reply.truncate(limit);
        }
        self.fifo.extend(reply);

        if self.error_status != 0 {
            self.set_reg(Register::Error, self.error_status);
            self.raise(irq::ERR | irq::RX | irq::IDLE);
        } else {
            self.raise(irq::RX | irq::IDLE);
        }
    }

    fn raise(&mut self, bits: u8) {
        let current = self.reg(Register::ComIrq);
        self.set_reg(Register::ComIrq, current | bits);
    }

    fn card_reply(&mut self, frame: &[u8], last_bits: u8) -> Option<Vec<u8>> {
        let card = self.card.as_mut()?;
        match frame {
            [picc::REQA] if last_bits == picc::SHORT_FRAME_BITS && !card.halted => {
                Some(ATQA.to_vec())
            }
            [picc::WUPA] if last_bits == picc::SHORT_FRAME_BITS => {
                card.halted = false;
                Some(ATQA.to_vec())
            }
            [picc::SEL_CL1, picc::NVB_ANTICOLLISION] if !card.halted => {
                let uid = card.uid.as_bytes();
                let bcc = uid.iter().fold(0, |acc, b| acc ^ b);
                let mut reply = vec![0x00];
                reply.extend_from_slice(uid);
                reply.push(bcc);
                Some(reply)
            }
            [picc::HLTA, 0x00] => {
                card.halted = true;
                None
            }
            _ => None,
        }
    }
}

fn lock(state: &Mutex<ChipState>) -> MutexGuard<'_, ChipState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Simulated reader chip, usable wherever a [`ReaderTransport`] is.
///
/// # Examples
///
/// ```
/// use securelock_core::CardUid;
/// use securelock_rfid::sim::SimulatedMfrc522;
///
/// let (_chip, handle) = SimulatedMfrc522::new();
/// handle.present_card(CardUid::new([1, 2, 3, 4]));
/// assert!(handle.card_present());
/// handle.remove_card();
/// assert!(!handle.card_present());
/// ```
#[derive(Debug)]
pub struct SimulatedMfrc522 {
    state: Arc<Mutex<ChipState>>,
}

impl SimulatedMfrc522 {
    pub fn new() -> (Self, SimulatedMfrc522Handle) {
        let state = Arc::new(Mutex::new(ChipState::new()));
        (
            Self {
                state: Arc::clone(&state),
            },
            SimulatedMfrc522Handle { state },
        )
    }
}

impl ReaderTransport for SimulatedMfrc522 {
    async fn exchange_byte(&mut self, byte: u8) -> securelock_hardware::Result<u8> {
        let mut chip = lock(&self.state);
        if chip.bus_fault {
            return Err(HardwareError::bus_fault("simulated bus fault"));
        }
        if !chip.selected {
            return Err(HardwareError::bus_fault("byte exchanged without chip select"));
        }
        if chip.in_reset {
            return Ok(0x00);
        }

        let response = match chip.phase {
            Phase::Address => {
                let addr = (byte >> 1) & 0x3F;
                chip.phase = if byte & 0x80 != 0 {
                    Phase::Read(addr)
                } else {
                    Phase::Write(addr)
                };
                0x00
            }
            Phase::Read(addr) => {
                chip.phase = Phase::Address;
                chip.read(addr)
            }
            Phase::Write(addr) => {
                chip.phase = Phase::Address;
                chip.write(addr, byte);
                0x00
            }
        };
        Ok(response)
    }

    fn select(&mut self) -> securelock_hardware::Result<()> {
        let mut chip = lock(&self.state);
        chip.selected = true;
        chip.phase = Phase::Address;
        chip.selects += 1;
        Ok(())
    }

    fn deselect(&mut self) {
        let mut chip = lock(&self.state);
        chip.selected = false;
        chip.phase = Phase::Address;
        chip.deselects += 1;
    }

    fn set_reset_line(&mut self, asserted: bool) -> securelock_hardware::Result<()> {
        let mut chip = lock(&self.state);
        if chip.in_reset && !asserted {
            chip.power_on();
            chip.hardware_resets += 1;
        }
        chip.in_reset = asserted;
        Ok(())
    }
}

/// Controls the field and fault injection of a [`SimulatedMfrc522`].
/// Cheap to clone.
#[derive(Debug, Clone)]
pub struct SimulatedMfrc522Handle {
    state: Arc<Mutex<ChipState>>,
}

impl SimulatedMfrc522Handle {
    /// Bring a card into the field, replacing any card already there.
    pub fn present_card(&self, uid: CardUid) {
        lock(&self.state).card = Some(Card { uid, halted: false });
    }

    /// Take the card out of the field.
    pub fn remove_card(&self) {
        lock(&self.state).card = None;
    }

    pub fn card_present(&self) -> bool {
        lock(&self.state).card.is_some()
    }

    /// True once the card in the field received HLTA.
    pub fn card_halted(&self) -> bool {
        lock(&self.state).card.is_some_and(|card| card.halted)
    }

    /// Fail every byte exchange until cleared.
    pub fn set_bus_fault(&self, fault: bool) {
        lock(&self.state).bus_fault = fault;
    }

    /// Never signal completion or timer expiry for a transceive.
    pub fn set_stalled(&self, stalled: bool) {
        lock(&self.state).stalled = stalled;
    }

    /// Report `status` in the error register after every reply (0 clears).
    pub fn set_error_status(&self, status: u8) {
        lock(&self.state).error_status = status;
    }

    /// Cut card replies to at most `limit` bytes.
    pub fn truncate_replies(&self, limit: Option<usize>) {
        lock(&self.state).reply_limit = limit;
    }

    pub fn antenna_on(&self) -> bool {
        lock(&self.state).reg(Register::TxControl) & ANTENNA_ON == ANTENNA_ON
    }

    pub fn register(&self, reg: Register) -> u8 {
        lock(&self.state).reg(reg)
    }

    pub fn is_selected(&self) -> bool {
        lock(&self.state).selected
    }

    /// `(selects, deselects)` seen so far.
    pub fn select_counts(&self) -> (u64, u64) {
        let chip = lock(&self.state);
        (chip.selects, chip.deselects)
    }

    pub fn hardware_resets(&self) -> u64 {
        lock(&self.state).hardware_resets
    }

    /// Every frame transmitted to the card, oldest first.
    pub fn frames(&self) -> Vec<Vec<u8>> {
        lock(&self.state).frames.clone()
    }
}
