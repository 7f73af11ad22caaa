//! Over-the-air frame model.
//!
//! A frame is always [`FRAME_SIZE`] (40) bytes: one 10-byte header segment
//! followed by three 10-byte record slots. Every segment packs 64 bits of
//! fields LSB-first (the first field sits in the low-order bits of byte 0)
//! and ends with a CRC16 over those 8 bytes. The same physical layout is
//! used as an implicit union for both packet kinds: the 4-bit type tag at
//! the start of the header decides whether it reads as a bootup header or a
//! data header, so callers must check the tag before interpreting the rest.

use crate::constants::{CRC_SPAN, FRAME_SIZE, RECORD_SLOTS, SEGMENT_SIZE};
use crate::crc::calc_crc16;
use crate::error::AmbimonError;
use bytes::Bytes;
use modular_bitfield::prelude::*;
use num_enum::{FromPrimitive, IntoPrimitive};
use strum_macros::Display;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// The 4-bit packet/segment type tag.
///
/// `DataGen0`..`DataGen2` tag the generation record slots inside a data
/// frame; only `Bootup` and `DataHeader` are valid at the head of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum PacketType {
    Unused = 0,
    Bootup = 1,
    DataHeader = 2,
    DataGen0 = 3,
    DataGen1 = 4,
    DataGen2 = 5,

    #[num_enum(catch_all)]
    Unknown(u8),
}

impl Default for PacketType {
    fn default() -> Self {
        PacketType::Unused
    }
}

impl PacketType {
    /// Generation slot index (0..=2) if this tags a generation record
    pub fn generation_index(&self) -> Option<usize> {
        match self {
            PacketType::DataGen0 => Some(0),
            PacketType::DataGen1 => Some(1),
            PacketType::DataGen2 => Some(2),
            _ => None,
        }
    }
}

/// Header segment of a bootup frame (type tag = `Bootup`)
#[bitfield(bytes = 10)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BootupHeader {
    pub packet_type: B4,
    pub dev_id: B4,
    pub firmware_version: u8,
    pub firmware_revision: u8,
    /// Data-frame transmit cycle in seconds
    pub data_pack_cycle_tm: u16,
    pub cfg_oled_display: bool,
    pub cfg_dht_sensor: bool,
    pub cfg_sr501_sensor: bool,
    pub cfg_adc_light_sensor: bool,
    pub cfg_adc_car_bat_ain: bool,
    pub cfg_async_lora_event: bool,
    pub sr501_pause_on_lora_tx: bool,
    pub commissioning_mode: bool,
    pub lora_tx_power: u8,
    pub lora_spread_factor: u8,
    pub crc16: u16,
}

/// Header segment of a data frame (type tag = `DataHeader`)
#[bitfield(bytes = 10)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataHeader {
    pub packet_type: B4,
    pub dev_id: B4,
    /// Rolling sequence number, wraps at 2^24
    pub sequ_num: B24,
    /// Station uptime in seconds
    pub uptime: u32,
    pub crc16: u16,
}

/// One generation record slot (type tag = `DataGen0`/`1`/`2`)
#[bitfield(bytes = 10)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataRecord {
    pub packet_type: B4,
    /// Uptime in 10-second steps, wraps at 4096 steps
    pub uptime_snippet: B12,
    /// Temperature in 0.5 degC steps, two's complement
    pub temperature: u8,
    /// Relative humidity in percent
    pub humidity: B7,
    pub motion_active: bool,
    /// Motion-active time in 10-second steps
    pub motion_active_time: u8,
    pub motion_active_count: B10,
    /// Light level in 2 percent steps
    pub light_level: B6,
    /// Battery level in 0.1 V steps
    pub car_batt_level: u8,
    pub crc16: u16,
}

impl BootupHeader {
    /// Compute the CRC over the 64-bit field block and store it
    pub fn seal(mut self) -> Self {
        let bytes = self.into_bytes();
        self.set_crc16(calc_crc16(&bytes[..CRC_SPAN]));
        self
    }

    /// Check the stored CRC against the field block
    pub fn crc_ok(&self) -> bool {
        let bytes = self.into_bytes();
        calc_crc16(&bytes[..CRC_SPAN]) == self.crc16()
    }
}

impl DataHeader {
    pub fn seal(mut self) -> Self {
        let bytes = self.into_bytes();
        self.set_crc16(calc_crc16(&bytes[..CRC_SPAN]));
        self
    }

    pub fn crc_ok(&self) -> bool {
        let bytes = self.into_bytes();
        calc_crc16(&bytes[..CRC_SPAN]) == self.crc16()
    }
}

impl DataRecord {
    pub fn seal(mut self) -> Self {
        let bytes = self.into_bytes();
        self.set_crc16(calc_crc16(&bytes[..CRC_SPAN]));
        self
    }

    pub fn crc_ok(&self) -> bool {
        let bytes = self.into_bytes();
        calc_crc16(&bytes[..CRC_SPAN]) == self.crc16()
    }
}

/// Byte view of one received or outgoing 40-byte frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct RawFrame {
    pub header: [u8; SEGMENT_SIZE],
    pub records: [[u8; SEGMENT_SIZE]; RECORD_SLOTS],
}

impl RawFrame {
    /// All-zero frame
    pub fn zeroed() -> Self {
        RawFrame {
            header: [0; SEGMENT_SIZE],
            records: [[0; SEGMENT_SIZE]; RECORD_SLOTS],
        }
    }

    /// Type tag from the low nibble of byte 0
    pub fn packet_type(&self) -> PacketType {
        PacketType::from_primitive(self.header[0] & 0x0F)
    }

    /// Device id from the high nibble of byte 0
    pub fn dev_id(&self) -> u8 {
        (self.header[0] >> 4) & 0x0F
    }

    /// Contiguous 40-byte wire representation
    pub fn to_bytes(&self) -> [u8; FRAME_SIZE] {
        let mut out = [0u8; FRAME_SIZE];
        out.copy_from_slice(self.as_bytes());
        out
    }
}

impl TryFrom<&[u8]> for RawFrame {
    type Error = AmbimonError;

    /// Any buffer whose length differs from 40 bytes is rejected before a
    /// single field is interpreted.
    fn try_from(buf: &[u8]) -> Result<Self, Self::Error> {
        RawFrame::read_from_bytes(buf).map_err(|_| AmbimonError::LengthMismatch {
            expected: FRAME_SIZE,
            actual: buf.len(),
        })
    }
}

impl TryFrom<Bytes> for RawFrame {
    type Error = AmbimonError;

    fn try_from(bytes: Bytes) -> Result<Self, Self::Error> {
        RawFrame::try_from(bytes.as_ref())
    }
}
