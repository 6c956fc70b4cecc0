//! K60 peripheral register blocks used during bring-up.
//!
//! Only the registers bring-up touches are named; the rest of each block is
//! reserved padding so offsets match the reference manual.

#![allow(dead_code)]

use tock_registers::registers::{ReadOnly, ReadWrite, WriteOnly};
use tock_registers::{register_bitfields, register_structs};

use crate::gpio::Port;

pub const SIM_BASE: usize = 0x4004_7000;
pub const MCG_BASE: usize = 0x4006_4000;
pub const SPI0_BASE: usize = 0x4002_C000;
pub const RTC_BASE: usize = 0x4003_D000;
pub const SMC_BASE: usize = 0x4007_E000;
pub const WDOG_BASE: usize = 0x4005_2000;

/// `PORTx` pin-control block for `port`.
pub const fn port_base(port: Port) -> usize {
    match port {
        Port::A => 0x4004_9000,
        Port::B => 0x4004_A000,
        Port::C => 0x4004_B000,
        Port::D => 0x4004_C000,
        Port::E => 0x4004_D000,
    }
}

/// `PTx` GPIO block for `port`.
pub const fn gpio_base(port: Port) -> usize {
    match port {
        Port::A => 0x400F_F000,
        Port::B => 0x400F_F040,
        Port::C => 0x400F_F080,
        Port::D => 0x400F_F0C0,
        Port::E => 0x400F_F100,
    }
}

register_structs! {
    pub SimRegisters {
        (0x0000 => pub sopt1: ReadWrite<u32>),
        (0x0004 => _reserved0),
        (0x1004 => pub sopt2: ReadWrite<u32>),
        (0x1008 => _reserved1),
        (0x1038 => pub scgc5: ReadWrite<u32, SCGC5::Register>),
        (0x103C => pub scgc6: ReadWrite<u32, SCGC6::Register>),
        (0x1040 => _reserved2),
        (0x1044 => pub clkdiv1: ReadWrite<u32>),
        (0x1048 => @END),
    },

    pub McgRegisters {
        (0x00 => pub c1: ReadWrite<u8>),
        (0x01 => pub c2: ReadWrite<u8>),
        (0x02 => pub c3: ReadWrite<u8>),
        (0x03 => pub c4: ReadWrite<u8>),
        (0x04 => pub c5: ReadWrite<u8>),
        (0x05 => pub c6: ReadWrite<u8>),
        (0x06 => pub s: ReadOnly<u8>),
        (0x07 => _reserved0),
        (0x08 => pub sc: ReadWrite<u8>),
        (0x09 => _reserved1),
        (0x0C => pub c7: ReadWrite<u8>),
        (0x0D => pub c8: ReadWrite<u8>),
        (0x0E => @END),
    },

    pub PortRegisters {
        (0x00 => pub pcr: [ReadWrite<u32, PCR::Register>; 32]),
        (0x80 => pub gpclr: WriteOnly<u32>),
        (0x84 => pub gpchr: WriteOnly<u32>),
        (0x88 => _reserved0),
        (0xA0 => pub isfr: ReadWrite<u32>),
        (0xA4 => @END),
    },

    pub GpioRegisters {
        (0x00 => pub pdor: ReadWrite<u32>),
        (0x04 => pub psor: WriteOnly<u32>),
        (0x08 => pub pcor: WriteOnly<u32>),
        (0x0C => pub ptor: WriteOnly<u32>),
        (0x10 => pub pdir: ReadOnly<u32>),
        (0x14 => pub pddr: ReadWrite<u32>),
        (0x18 => @END),
    },

    pub DspiRegisters {
        (0x00 => pub mcr: ReadWrite<u32, MCR::Register>),
        (0x04 => _reserved0),
        (0x08 => pub tcr: ReadWrite<u32>),
        (0x0C => pub ctar0: ReadWrite<u32, CTAR::Register>),
        (0x10 => pub ctar1: ReadWrite<u32, CTAR::Register>),
        (0x14 => _reserved1),
        (0x2C => pub sr: ReadWrite<u32, SR::Register>),
        (0x30 => pub rser: ReadWrite<u32>),
        (0x34 => pub pushr: ReadWrite<u32, PUSHR::Register>),
        (0x38 => pub popr: ReadOnly<u32>),
        (0x3C => @END),
    },

    pub RtcRegisters {
        (0x00 => pub tsr: ReadWrite<u32>),
        (0x04 => pub tpr: ReadWrite<u32>),
        (0x08 => pub tar: ReadWrite<u32>),
        (0x0C => pub tcr: ReadWrite<u32>),
        (0x10 => pub cr: ReadWrite<u32, RTC_CR::Register>),
        (0x14 => pub sr: ReadWrite<u32>),
        (0x18 => @END),
    },

    pub SmcRegisters {
        (0x00 => pub pmprot: ReadWrite<u8>),
        (0x01 => pub pmctrl: ReadWrite<u8>),
        (0x02 => pub vllsctrl: ReadWrite<u8>),
        (0x03 => pub pmstat: ReadOnly<u8>),
        (0x04 => @END),
    },

    pub WdogRegisters {
        (0x00 => pub stctrlh: ReadWrite<u16>),
        (0x02 => pub stctrll: ReadWrite<u16>),
        (0x04 => pub tovalh: ReadWrite<u16>),
        (0x06 => pub tovall: ReadWrite<u16>),
        (0x08 => pub winh: ReadWrite<u16>),
        (0x0A => pub winl: ReadWrite<u16>),
        (0x0C => pub refresh: ReadWrite<u16>),
        (0x0E => pub unlock: WriteOnly<u16>),
        (0x10 => @END),
    }
}

register_bitfields![u32,
    pub SCGC5 [
        PORTA OFFSET(9) NUMBITS(1) [],
        PORTB OFFSET(10) NUMBITS(1) [],
        PORTC OFFSET(11) NUMBITS(1) [],
        PORTD OFFSET(12) NUMBITS(1) [],
        PORTE OFFSET(13) NUMBITS(1) []
    ],
    pub SCGC6 [
        SPI0 OFFSET(12) NUMBITS(1) [],
        RTC OFFSET(29) NUMBITS(1) []
    ],
    pub PCR [
        ISF OFFSET(24) NUMBITS(1) [],
        MUX OFFSET(8) NUMBITS(3) [
            Analog = 0,
            Gpio = 1,
            Alt2 = 2
        ],
        DSE OFFSET(6) NUMBITS(1) [],
        PE OFFSET(1) NUMBITS(1) [],
        PS OFFSET(0) NUMBITS(1) [
            PullDown = 0,
            PullUp = 1
        ]
    ],
    pub MCR [
        MSTR OFFSET(31) NUMBITS(1) [],
        PCSIS OFFSET(16) NUMBITS(6) [],
        MDIS OFFSET(14) NUMBITS(1) [],
        DIS_TXF OFFSET(13) NUMBITS(1) [],
        DIS_RXF OFFSET(12) NUMBITS(1) [],
        CLR_TXF OFFSET(11) NUMBITS(1) [],
        CLR_RXF OFFSET(10) NUMBITS(1) [],
        HALT OFFSET(0) NUMBITS(1) []
    ],
    pub CTAR [
        DBR OFFSET(31) NUMBITS(1) [],
        FMSZ OFFSET(27) NUMBITS(4) [],
        CPOL OFFSET(26) NUMBITS(1) [],
        CPHA OFFSET(25) NUMBITS(1) [],
        LSBFE OFFSET(24) NUMBITS(1) [],
        PBR OFFSET(16) NUMBITS(2) [],
        BR OFFSET(0) NUMBITS(4) []
    ],
    pub SR [
        TCF OFFSET(31) NUMBITS(1) [],
        EOQF OFFSET(28) NUMBITS(1) [],
        TFFF OFFSET(25) NUMBITS(1) [],
        RFDF OFFSET(17) NUMBITS(1) []
    ],
    pub PUSHR [
        CONT OFFSET(31) NUMBITS(1) [],
        CTAS OFFSET(28) NUMBITS(3) [],
        PCS OFFSET(16) NUMBITS(6) [],
        TXDATA OFFSET(0) NUMBITS(16) []
    ],
    pub RTC_CR [
        SC2P OFFSET(13) NUMBITS(1) [],
        SC4P OFFSET(12) NUMBITS(1) [],
        SC8P OFFSET(11) NUMBITS(1) [],
        SC16P OFFSET(10) NUMBITS(1) [],
        OSCE OFFSET(8) NUMBITS(1) []
    ]
];

/// Borrow the register block at `base`.
///
/// # Safety
///
/// `base` must be the address of a live `T` peripheral block, and the caller
/// must be the only code driving that block for the returned lifetime.
pub unsafe fn block<T>(base: usize) -> &'static T {
    // SAFETY: caller guarantees `base` addresses a valid, exclusively owned block.
    unsafe { &*(base as *const T) }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    #[test]
    fn port_blocks_are_4k_apart_and_gpio_blocks_64_bytes_apart() {
        let ports = [Port::A, Port::B, Port::C, Port::D, Port::E];
        for pair in ports.windows(2) {
            if let [a, b] = pair {
                assert_eq!(port_base(*b) - port_base(*a), 0x1000);
                assert_eq!(gpio_base(*b) - gpio_base(*a), 0x40);
            }
        }
    }
}
