//! Reader protocol engine.

use securelock_core::CardUid;
use securelock_hardware::{ChipSelect, ReaderTransport};
use tokio::time::{Instant, sleep};
use tracing::{debug, info, trace};

use crate::config::ReaderConfig;
use crate::error::{ReaderError, Result};
use crate::registers::{
    ANTENNA_ON, ChipCommand, FIFO_SIZE, FLUSH_BUFFER, INIT_SEQUENCE, Register, START_SEND,
    error_bits, irq, picc,
};

/// Length of a valid answer to request (ATQA).
const ATQA_LENGTH: usize = 2;

/// Shortest anticollision reply that carries a full identifier.
const MIN_ANTICOLLISION_REPLY: usize = 5;

/// MFRC522 driver over any [`ReaderTransport`].
///
/// Each register access is one chip-select transaction:
/// `[address, data]` for writes, `[address | 0x80, 0x00]` for reads.
/// Nothing here retries; callers poll again on the next cycle.
#[derive(Debug)]
pub struct Mfrc522<T> {
    transport: T,
    config: ReaderConfig,
}

impl<T: ReaderTransport> Mfrc522<T> {
    pub fn new(transport: T, config: ReaderConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Hardware reset, soft reset, timer and modulation setup, antenna on.
    ///
    /// # Errors
    ///
    /// Returns the first transport failure. The chip is in an unknown
    /// state afterwards and `init` should be called again.
    pub async fn init(&mut self) -> Result<()> {
        self.transport.reset().await?;

        self.write_register(Register::Command, ChipCommand::SoftReset as u8)
            .await?;
        sleep(self.config.soft_reset_delay()).await;

        for (reg, value) in INIT_SEQUENCE {
            self.write_register(reg, value).await?;
        }

        let tx_control = self.read_register(Register::TxControl).await?;
        if tx_control & ANTENNA_ON != ANTENNA_ON {
            self.write_register(Register::TxControl, tx_control | ANTENNA_ON)
                .await?;
        }

        let version = self.read_register(Register::Version).await?;
        info!(version = format_args!("{version:#04x}"), "reader initialized");
        Ok(())
    }

    /// Write one register.
    pub async fn write_register(&mut self, reg: Register, value: u8) -> Result<()> {
        trace!(?reg, value = format_args!("{value:#04x}"), "register write");
        let mut cs = ChipSelect::acquire(&mut self.transport)?;
        cs.exchange(reg.write_address()).await?;
        cs.exchange(value).await?;
        Ok(())
    }

    /// Read one register.
    pub async fn read_register(&mut self, reg: Register) -> Result<u8> {
        let value = {
            let mut cs = ChipSelect::acquire(&mut self.transport)?;
            cs.exchange(reg.read_address()).await?;
            cs.exchange(0x00).await?
        };
        trace!(?reg, value = format_args!("{value:#04x}"), "register read");
        Ok(value)
    }

    /// Send `frame` to the card and collect its reply.
    ///
    /// `tx_last_bits` is the number of valid bits in the last byte
    /// (0 means all eight).
    async fn transceive(&mut self, frame: &[u8], tx_last_bits: u8) -> Result<Vec<u8>> {
        self.write_register(Register::Command, ChipCommand::Idle as u8)
            .await?;
        self.write_register(Register::ComIrq, irq::ALL).await?;
        self.write_register(Register::FifoLevel, FLUSH_BUFFER).await?;
        for &byte in frame {
            self.write_register(Register::FifoData, byte).await?;
        }

        let framing = tx_last_bits & 0x07;
        self.write_register(Register::BitFraming, framing).await?;
        self.write_register(Register::Command, ChipCommand::Transceive as u8)
            .await?;
        self.write_register(Register::BitFraming, framing | START_SEND)
            .await?;

        let outcome = self.wait_for_completion().await;
        self.write_register(Register::BitFraming, framing).await?;
        outcome?;

        let status = self.read_register(Register::Error).await?;
        if status & error_bits::FATAL != 0 {
            return Err(ReaderError::Protocol { status });
        }

        let level = usize::from(self.read_register(Register::FifoLevel).await? & 0x7F);
        let mut reply = Vec::with_capacity(level.min(FIFO_SIZE));
        for _ in 0..level.min(FIFO_SIZE) {
            reply.push(self.read_register(Register::FifoData).await?);
        }
        trace!(?frame, ?reply, "transceive complete");
        Ok(reply)
    }

    /// Poll the interrupt register until the exchange completes, the chip
    /// timer fires, or the wall-clock deadline passes.
    async fn wait_for_completion(&mut self) -> Result<()> {
        let timeout = self.config.transceive_timeout();
        let deadline = Instant::now() + timeout;
        let timed_out = || ReaderError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        };

        loop {
            let flags = self.read_register(Register::ComIrq).await?;
            if flags & irq::COMPLETE != 0 {
                return Ok(());
            }
            if flags & irq::TIMER != 0 || Instant::now() >= deadline {
                return Err(timed_out());
            }
            sleep(self.config.poll_interval()).await;
        }
    }

    /// Is a card answering in the field?
    ///
    /// Sends REQA; only a well-formed two-byte ATQA counts as present.
    /// Every failure is reported as "no card".
    pub async fn detect_card(&mut self) -> bool {
        match self.transceive(&[picc::REQA], picc::SHORT_FRAME_BITS).await {
            Ok(atqa) if atqa.len() == ATQA_LENGTH => true,
            Ok(reply) => {
                debug!(len = reply.len(), "unexpected REQA reply length");
                false
            }
            Err(e) if e.is_timeout() => false,
            Err(e) => {
                debug!(error = %e, "card detection failed");
                false
            }
        }
    }

    /// Read the 4-byte identifier of the card in the field.
    ///
    /// Runs the cascade level 1 anticollision; the identifier is bytes 1..=4
    /// of a reply of at least five bytes. Every failure yields `None`; a
    /// partial identifier is never returned.
    pub async fn read_uid(&mut self) -> Option<CardUid> {
        let frame = [picc::SEL_CL1, picc::NVB_ANTICOLLISION];
        match self.transceive(&frame, 0).await {
            Ok(reply) if reply.len() >= MIN_ANTICOLLISION_REPLY => {
                CardUid::from_slice(&reply[1..MIN_ANTICOLLISION_REPLY]).ok()
            }
            Ok(reply) => {
                debug!(len = reply.len(), "anticollision reply too short");
                None
            }
            Err(e) => {
                debug!(error = %e, "identifier read failed");
                None
            }
        }
    }

    /// Put the card to sleep so it stops answering REQA until it leaves
    /// the field. Fire and forget: a halted card never replies.
    pub async fn halt(&mut self) {
        if let Err(e) = self.transceive(&[picc::HLTA, 0x00], 0).await {
            if !e.is_timeout() {
                debug!(error = %e, "halt failed");
            }
        }
    }
}
