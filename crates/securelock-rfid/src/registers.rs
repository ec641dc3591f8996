//! MFRC522 register map, chip commands and ISO 14443A card commands.

/// Chip registers reached over the serial interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Register {
    Command = 0x01,
    ComIEn = 0x02,
    DivIEn = 0x03,
    ComIrq = 0x04,
    DivIrq = 0x05,
    Error = 0x06,
    Status1 = 0x07,
    Status2 = 0x08,
    FifoData = 0x09,
    FifoLevel = 0x0A,
    Control = 0x0C,
    BitFraming = 0x0D,
    Coll = 0x0E,
    Mode = 0x11,
    TxControl = 0x14,
    TxAsk = 0x15,
    CrcResultH = 0x21,
    CrcResultL = 0x22,
    TMode = 0x2A,
    TPrescaler = 0x2B,
    TReloadH = 0x2C,
    TReloadL = 0x2D,
    Version = 0x37,
}

impl Register {
    pub const fn addr(self) -> u8 {
        self as u8
    }

    /// First byte of a write transaction: address in bits 6..1, bit 7 clear.
    pub const fn write_address(self) -> u8 {
        (self.addr() << 1) & 0x7E
    }

    /// First byte of a read transaction: address in bits 6..1, bit 7 set.
    pub const fn read_address(self) -> u8 {
        ((self.addr() << 1) & 0x7E) | 0x80
    }
}

/// Values written to [`Register::Command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ChipCommand {
    Idle = 0x00,
    CalcCrc = 0x03,
    Transceive = 0x0C,
    SoftReset = 0x0F,
}

impl ChipCommand {
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits & 0x0F {
            0x00 => Some(Self::Idle),
            0x03 => Some(Self::CalcCrc),
            0x0C => Some(Self::Transceive),
            0x0F => Some(Self::SoftReset),
            _ => None,
        }
    }
}

/// Commands sent to the card through the FIFO.
pub mod picc {
    /// Request type A, sent as a 7-bit short frame.
    pub const REQA: u8 = 0x26;
    /// Wake-up type A, also answered by halted cards.
    pub const WUPA: u8 = 0x52;
    /// Anticollision / select, cascade level 1.
    pub const SEL_CL1: u8 = 0x93;
    /// Number-of-valid-bits byte for an anticollision request with no known UID bits.
    pub const NVB_ANTICOLLISION: u8 = 0x20;
    /// Halt type A.
    pub const HLTA: u8 = 0x50;

    /// Bits of the last byte to transmit for a short frame.
    pub const SHORT_FRAME_BITS: u8 = 7;
}

/// [`Register::ComIrq`] bits.
pub mod irq {
    pub const TIMER: u8 = 0x01;
    pub const ERR: u8 = 0x02;
    pub const LO_ALERT: u8 = 0x04;
    pub const HI_ALERT: u8 = 0x08;
    pub const IDLE: u8 = 0x10;
    pub const RX: u8 = 0x20;
    pub const TX: u8 = 0x40;
    /// Written with other bits: set them instead of clearing them.
    pub const SET1: u8 = 0x80;

    /// All clearable request bits.
    pub const ALL: u8 = 0x7F;
    /// Either bit means the exchange finished.
    pub const COMPLETE: u8 = RX | IDLE;
}

/// [`Register::Error`] bits.
pub mod error_bits {
    pub const PROTOCOL: u8 = 0x01;
    pub const PARITY: u8 = 0x02;
    pub const CRC: u8 = 0x04;
    pub const COLLISION: u8 = 0x08;
    pub const BUFFER_OVERFLOW: u8 = 0x10;

    /// Faults that invalidate a received frame.
    pub const FATAL: u8 = PROTOCOL | PARITY | CRC | COLLISION | BUFFER_OVERFLOW;
}

/// [`Register::FifoLevel`] write bit that empties the FIFO.
pub const FLUSH_BUFFER: u8 = 0x80;

/// [`Register::BitFraming`] bit that starts transmission of a transceive.
pub const START_SEND: u8 = 0x80;

/// [`Register::TxControl`] bits driving both antenna pins.
pub const ANTENNA_ON: u8 = 0x03;

/// FIFO capacity in bytes.
pub const FIFO_SIZE: usize = 64;

/// Initial register image applied by `Mfrc522::init`.
///
/// Timer starts automatically at the end of transmission with a ~15 ms
/// reload, 100% ASK modulation, CRC preset 0x6363.
pub const INIT_SEQUENCE: [(Register, u8); 6] = [
    (Register::TMode, 0x8D),
    (Register::TPrescaler, 0x3E),
    (Register::TReloadL, 30),
    (Register::TReloadH, 0),
    (Register::TxAsk, 0x40),
    (Register::Mode, 0x3D),
];

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Register::Command, 0x02, 0x82)]
    #[case(Register::ComIrq, 0x08, 0x88)]
    #[case(Register::FifoData, 0x12, 0x92)]
    #[case(Register::Version, 0x6E, 0xEE)]
    fn test_address_encoding(#[case] reg: Register, #[case] write: u8, #[case] read: u8) {
        assert_eq!(reg.write_address(), write);
        assert_eq!(reg.read_address(), read);
    }

    #[test]
    fn test_chip_command_from_bits_ignores_power_bits() {
        assert_eq!(ChipCommand::from_bits(0x2C), Some(ChipCommand::Transceive));
        assert_eq!(ChipCommand::from_bits(0x07), None);
    }
}
