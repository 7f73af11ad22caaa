//! Gateway-side payload decoder.
//!
//! Decoding is best effort: a 40-byte frame always yields a fully populated
//! structure, and per-segment [`DataStatus`] tags tell the caller how far
//! each segment can be trusted. An all-zero field block is `Unused` (never
//! transmitted as real data), a checksum failure is `CrcError`; both mean
//! the segment's fields must not be acted on, but they are distinguishable
//! failure reasons.

use crate::codec::{i8_to_float, u7_to_float, u8_to_float};
use crate::constants::{CRC_SPAN, SNIPPET_STEP_SECS};
use crate::packet::{BootupHeader, DataHeader, DataRecord, PacketType, RawFrame};
use strum_macros::Display;

/// Per-segment trust classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum DataStatus {
    #[default]
    Unused,
    CrcError,
    Valid,
}

/// Decoded bootup frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StationBootup {
    pub status: DataStatus,
    pub packet_type: PacketType,
    pub dev_id: u8,
    pub firmware_version: u8,
    pub firmware_revision: u8,
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
}

/// Decoded header of a data frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DataHeaderInfo {
    pub status: DataStatus,
    pub packet_type: PacketType,
    pub dev_id: u8,
    pub sequ_num: u32,
    pub uptime: u32,
}

/// One decoded generation record, widened to engineering units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RecordInfo {
    pub status: DataStatus,
    pub packet_type: PacketType,
    /// seconds (snippet steps expanded)
    pub uptime_snippet: u32,
    /// degC
    pub temperature: f32,
    /// percent
    pub humidity: f32,
    pub motion_active: bool,
    /// seconds
    pub motion_active_time: u16,
    pub motion_active_count: u16,
    /// percent
    pub light_level: u8,
    /// volts
    pub car_batt_level: f32,
}

/// Decoded data frame: header plus the three generation slots
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StationData {
    pub header: DataHeaderInfo,
    pub records: [RecordInfo; 3],
}

/// True if the segment's 64-bit field block is fully cleared
fn is_cleared(block: &[u8]) -> bool {
    block[..CRC_SPAN].iter().all(|&b| b == 0)
}

/// Decode a frame as a bootup announcement.
///
/// All fields are extracted regardless of the CRC outcome; the caller must
/// inspect `status` before trusting them.
pub fn decode_bootup(frame: &RawFrame) -> StationBootup {
    let header = BootupHeader::from_bytes(frame.header);

    StationBootup {
        status: if header.crc_ok() {
            DataStatus::Valid
        } else {
            DataStatus::CrcError
        },
        packet_type: PacketType::from(header.packet_type()),
        dev_id: header.dev_id(),
        firmware_version: header.firmware_version(),
        firmware_revision: header.firmware_revision(),
        data_pack_cycle_tm: header.data_pack_cycle_tm(),
        cfg_oled_display: header.cfg_oled_display(),
        cfg_dht_sensor: header.cfg_dht_sensor(),
        cfg_sr501_sensor: header.cfg_sr501_sensor(),
        cfg_adc_light_sensor: header.cfg_adc_light_sensor(),
        cfg_adc_car_bat_ain: header.cfg_adc_car_bat_ain(),
        cfg_async_lora_event: header.cfg_async_lora_event(),
        sr501_pause_on_lora_tx: header.sr501_pause_on_lora_tx(),
        commissioning_mode: header.commissioning_mode(),
        lora_tx_power: header.lora_tx_power(),
        lora_spread_factor: header.lora_spread_factor(),
    }
}

/// Decode a frame as a data packet.
///
/// Each record slot is classified independently; a corrupt slot does not
/// abort decoding of the others.
pub fn decode_data(frame: &RawFrame) -> StationData {
    let header = DataHeader::from_bytes(frame.header);

    let mut out = StationData {
        header: DataHeaderInfo {
            status: if header.crc_ok() {
                DataStatus::Valid
            } else {
                DataStatus::CrcError
            },
            packet_type: PacketType::from(header.packet_type()),
            dev_id: header.dev_id(),
            sequ_num: header.sequ_num(),
            uptime: header.uptime(),
        },
        records: Default::default(),
    };

    for (slot, bytes) in out.records.iter_mut().zip(frame.records.iter()) {
        if is_cleared(bytes) {
            slot.status = DataStatus::Unused;
            continue;
        }

        let record = DataRecord::from_bytes(*bytes);
        slot.status = if record.crc_ok() {
            DataStatus::Valid
        } else {
            DataStatus::CrcError
        };
        slot.packet_type = PacketType::from(record.packet_type());
        slot.uptime_snippet = record.uptime_snippet() as u32 * SNIPPET_STEP_SECS;
        slot.temperature = i8_to_float(record.temperature()) / 2.0;
        slot.humidity = u7_to_float(record.humidity());
        slot.motion_active = record.motion_active();
        slot.motion_active_time = record.motion_active_time() as u16 * 10;
        slot.motion_active_count = record.motion_active_count();
        slot.light_level = record.light_level() * 2;
        slot.car_batt_level = u8_to_float(record.car_batt_level()) / 10.0;
    }

    out
}
