//! Packet processor: turns a received frame into qualified, publishable
//! messages.
//!
//! The processor reconstructs the absolute sequence number and uptime for
//! every generation slot from the single absolute header value plus the
//! truncated per-record snippets, then renders one JSON message per valid
//! generation. Messages for a data frame are emitted oldest first (Gen2,
//! Gen1, Gen0) so that downstream consumers see surviving history in
//! chronological order.

use crate::constants::{SNIPPET_MASK, SNIPPET_STEP_SECS};
use crate::decoder::{DataStatus, StationBootup, StationData, decode_bootup, decode_data};
use crate::error::AmbimonError;
use crate::packet::{PacketType, RawFrame};
use chrono::DateTime;
use serde::Serialize;
use tracing::{debug, warn};

/// Receive-side metadata supplied by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RxMetadata {
    /// Receiver-local message counter
    pub msg_id: u32,
    /// Receive timestamp (Unix seconds)
    pub timestamp: i64,
    /// Signal strength reported by the radio, dB
    pub rssi: i8,
}

/// Absolute values recovered for one generation slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconstructedRecord {
    pub sequ_num: u32,
    /// Station uptime in seconds at sample time
    pub uptime: u32,
    /// Sample timestamp (Unix seconds), derived from the receive timestamp
    pub timestamp: i64,
}

/// Decoded payload of one frame
#[derive(Debug, Clone, PartialEq)]
pub enum StationRecord {
    Bootup(StationBootup),
    Data {
        data: StationData,
        reconstructed: [ReconstructedRecord; 3],
    },
}

/// One fully decoded and classified frame
#[derive(Debug, Clone, PartialEq)]
pub struct LoraRecord {
    pub meta: RxMetadata,
    pub dev_id: u8,
    pub packet_type: PacketType,
    pub record: StationRecord,
}

/// One outbound message, ready for publish/log
#[derive(Debug, Clone, PartialEq)]
pub struct JsonMessage {
    pub msg_id: u32,
    pub packet_type: PacketType,
    pub dev_id: u8,
    pub sequ_num: u32,
    pub rssi: i8,
    /// Receive timestamp of the carrying frame (Unix seconds)
    pub timestamp: i64,
    pub json_record: String,
}

#[derive(Serialize)]
struct BootupJsonRecord {
    #[serde(rename = "MsgID")]
    msg_id: u32,
    #[serde(rename = "MsgType")]
    msg_type: &'static str,
    #[serde(rename = "TimeStamp")]
    timestamp: i64,
    #[serde(rename = "TimeStampFmt")]
    timestamp_fmt: String,
    #[serde(rename = "RSSI")]
    rssi: i8,
    #[serde(rename = "DevID")]
    dev_id: u8,
    #[serde(rename = "FirmwareVer")]
    firmware_ver: String,
    #[serde(rename = "DataPackCycleTm")]
    data_pack_cycle_tm: u16,
    #[serde(rename = "CfgOledDisplay")]
    cfg_oled_display: u8,
    #[serde(rename = "CfgDhtSensor")]
    cfg_dht_sensor: u8,
    #[serde(rename = "CfgSr501Sensor")]
    cfg_sr501_sensor: u8,
    #[serde(rename = "CfgAdcLightSensor")]
    cfg_adc_light_sensor: u8,
    #[serde(rename = "CfgAdcCarBatAin")]
    cfg_adc_car_bat_ain: u8,
    #[serde(rename = "CfgAsyncLoraEvent")]
    cfg_async_lora_event: u8,
    #[serde(rename = "Sr501PauseOnLoraTx")]
    sr501_pause_on_lora_tx: u8,
    #[serde(rename = "CommissioningMode")]
    commissioning_mode: u8,
    #[serde(rename = "LoraTxPower")]
    lora_tx_power: u8,
    #[serde(rename = "LoraSpreadFactor")]
    lora_spread_factor: u8,
}

#[derive(Serialize)]
struct DataJsonRecord {
    #[serde(rename = "MsgID")]
    msg_id: u32,
    #[serde(rename = "MsgType")]
    msg_type: String,
    #[serde(rename = "TimeStamp")]
    timestamp: i64,
    #[serde(rename = "TimeStampFmt")]
    timestamp_fmt: String,
    #[serde(rename = "RSSI")]
    rssi: i8,
    #[serde(rename = "DevID")]
    dev_id: u8,
    #[serde(rename = "SequNum")]
    sequ_num: u32,
    #[serde(rename = "Uptime")]
    uptime: u32,
    #[serde(rename = "UptimeFmt")]
    uptime_fmt: String,
    #[serde(rename = "Temperature")]
    temperature: f32,
    #[serde(rename = "Humidity")]
    humidity: f32,
    #[serde(rename = "MotionActive")]
    motion_active: u8,
    #[serde(rename = "MotionActiveTime")]
    motion_active_time: u16,
    #[serde(rename = "MotionActiveCount")]
    motion_active_count: u16,
    #[serde(rename = "LightLevel")]
    light_level: u8,
    #[serde(rename = "CarBattLevel")]
    car_batt_level: f32,
}

/// Decode and classify one received buffer.
///
/// The length check runs before any field access; an Unused tag, a
/// generation tag at the head of a frame, or an unknown tag all fail
/// closed.
pub fn gain_record(meta: RxMetadata, buf: &[u8]) -> Result<LoraRecord, AmbimonError> {
    let frame = RawFrame::try_from(buf)?;
    let packet_type = frame.packet_type();
    let dev_id = frame.dev_id();

    debug!(
        msg_id = meta.msg_id,
        dev_id,
        %packet_type,
        "classifying received frame"
    );

    match packet_type {
        PacketType::Bootup => Ok(LoraRecord {
            meta,
            dev_id,
            packet_type,
            record: StationRecord::Bootup(decode_bootup(&frame)),
        }),
        PacketType::DataHeader => {
            let data = decode_data(&frame);
            let reconstructed = match reconstruct(&data, meta.timestamp) {
                Ok(records) => records,
                Err(err) => {
                    warn!(msg_id = meta.msg_id, %err, "reconstruction skipped");
                    Default::default()
                }
            };
            Ok(LoraRecord {
                meta,
                dev_id,
                packet_type,
                record: StationRecord::Data {
                    data,
                    reconstructed,
                },
            })
        }
        other => Err(AmbimonError::UnexpectedPacketType(other)),
    }
}

/// Recover absolute sequence numbers, uptimes and timestamps for the three
/// generation slots.
///
/// Requires an intact header. The slots of a frame hold three consecutive
/// generations, so each slot's sequence number is the header sequence minus
/// the slot index. Gen0 takes uptime and timestamp straight from the
/// header; for older generations the uptime difference is recovered from
/// the snippet fields, applying the same truncation to the header uptime
/// that the station applied when it encoded the record.
pub fn reconstruct(
    data: &StationData,
    rx_timestamp: i64,
) -> Result<[ReconstructedRecord; 3], AmbimonError> {
    if data.header.status != DataStatus::Valid {
        return Err(AmbimonError::CorruptHeader);
    }

    let mut out = [ReconstructedRecord::default(); 3];
    let header_snippet =
        ((data.header.uptime / SNIPPET_STEP_SECS) & SNIPPET_MASK) * SNIPPET_STEP_SECS;

    for (index, (record, slot)) in data.records.iter().zip(out.iter_mut()).enumerate() {
        if record.status != DataStatus::Valid {
            debug!(index, status = %record.status, "skipping generation slot");
            continue;
        }

        slot.sequ_num = data.header.sequ_num.wrapping_sub(index as u32);

        if record.packet_type == PacketType::DataGen0 {
            slot.uptime = data.header.uptime;
            slot.timestamp = rx_timestamp;
        } else {
            let diff = header_snippet.wrapping_sub(record.uptime_snippet) & SNIPPET_MASK;
            slot.uptime = data.header.uptime.wrapping_sub(diff);
            slot.timestamp = rx_timestamp - diff as i64;
        }
    }

    Ok(out)
}

/// Render the outbound messages for one classified frame.
///
/// Bootup yields one message; a data frame yields one message per valid
/// generation, oldest first.
pub fn build_messages(record: &LoraRecord) -> Result<Vec<JsonMessage>, AmbimonError> {
    match &record.record {
        StationRecord::Bootup(bootup) => build_bootup_message(record, bootup),
        StationRecord::Data {
            data,
            reconstructed,
        } => build_data_messages(record, data, reconstructed),
    }
}

fn build_bootup_message(
    record: &LoraRecord,
    bootup: &StationBootup,
) -> Result<Vec<JsonMessage>, AmbimonError> {
    if bootup.status != DataStatus::Valid {
        return Err(AmbimonError::CorruptHeader);
    }

    let json = BootupJsonRecord {
        msg_id: record.meta.msg_id,
        msg_type: "StationBootup",
        timestamp: record.meta.timestamp,
        timestamp_fmt: format_timestamp(record.meta.timestamp),
        rssi: record.meta.rssi,
        dev_id: bootup.dev_id,
        firmware_ver: format!(
            "{}.{:02}",
            bootup.firmware_version, bootup.firmware_revision
        ),
        data_pack_cycle_tm: bootup.data_pack_cycle_tm,
        cfg_oled_display: bootup.cfg_oled_display as u8,
        cfg_dht_sensor: bootup.cfg_dht_sensor as u8,
        cfg_sr501_sensor: bootup.cfg_sr501_sensor as u8,
        cfg_adc_light_sensor: bootup.cfg_adc_light_sensor as u8,
        cfg_adc_car_bat_ain: bootup.cfg_adc_car_bat_ain as u8,
        cfg_async_lora_event: bootup.cfg_async_lora_event as u8,
        sr501_pause_on_lora_tx: bootup.sr501_pause_on_lora_tx as u8,
        commissioning_mode: bootup.commissioning_mode as u8,
        lora_tx_power: bootup.lora_tx_power,
        lora_spread_factor: bootup.lora_spread_factor,
    };

    Ok(vec![JsonMessage {
        msg_id: record.meta.msg_id,
        packet_type: record.packet_type,
        dev_id: bootup.dev_id,
        sequ_num: 0,
        rssi: record.meta.rssi,
        timestamp: record.meta.timestamp,
        json_record: serde_json::to_string_pretty(&json)?,
    }])
}

fn build_data_messages(
    record: &LoraRecord,
    data: &StationData,
    reconstructed: &[ReconstructedRecord; 3],
) -> Result<Vec<JsonMessage>, AmbimonError> {
    if data.header.status != DataStatus::Valid {
        return Err(AmbimonError::CorruptHeader);
    }

    let mut messages = Vec::new();

    // oldest generation first, so surviving history stays in order
    for index in (0..data.records.len()).rev() {
        let slot = &data.records[index];
        if slot.status != DataStatus::Valid {
            continue;
        }
        let recovered = &reconstructed[index];

        let json = DataJsonRecord {
            msg_id: record.meta.msg_id,
            msg_type: format!("StationDataGen{index}"),
            timestamp: recovered.timestamp,
            timestamp_fmt: format_timestamp(recovered.timestamp),
            rssi: record.meta.rssi,
            dev_id: data.header.dev_id,
            sequ_num: recovered.sequ_num,
            uptime: recovered.uptime,
            uptime_fmt: format_uptime(recovered.uptime),
            temperature: slot.temperature,
            humidity: slot.humidity,
            motion_active: slot.motion_active as u8,
            motion_active_time: slot.motion_active_time,
            motion_active_count: slot.motion_active_count,
            light_level: slot.light_level,
            car_batt_level: slot.car_batt_level,
        };

        messages.push(JsonMessage {
            msg_id: record.meta.msg_id,
            packet_type: slot.packet_type,
            dev_id: data.header.dev_id,
            sequ_num: recovered.sequ_num,
            rssi: record.meta.rssi,
            timestamp: record.meta.timestamp,
            json_record: serde_json::to_string_pretty(&json)?,
        });
    }

    Ok(messages)
}

/// Compact single-line diagnostic for one message
pub fn build_telemetry(message: &JsonMessage) -> String {
    let timestamp = format_timestamp(message.timestamp).replace(' ', "");
    format!(
        "Time={}, MsgID={}, Dev={}, Seq={}, RSSI={}",
        timestamp, message.msg_id, message.dev_id, message.sequ_num, message.rssi
    )
}

/// Publish topic for one message, derived from device id and packet kind.
///
/// The topic shapes are consumed by deployed dashboards and must not
/// change.
pub fn publish_topic(message: &JsonMessage) -> Result<String, AmbimonError> {
    if message.packet_type == PacketType::Bootup {
        Ok(format!("LoraAmbMon/Data/DevID{:03}/Bootup", message.dev_id))
    } else if message.packet_type.generation_index().is_some() {
        Ok(format!("LoraAmbMon/Data/DevID{:03}/StData", message.dev_id))
    } else {
        Err(AmbimonError::UnexpectedPacketType(message.packet_type))
    }
}

/// `2023/03/11 - 15:51:05` (UTC)
pub fn format_timestamp(timestamp: i64) -> String {
    match DateTime::from_timestamp(timestamp, 0) {
        Some(ts) => ts.format("%Y/%m/%d - %H:%M:%S").to_string(),
        None => String::from("????/??/?? - ??:??:??"),
    }
}

/// `0d/00:01:06`
pub fn format_uptime(uptime_secs: u32) -> String {
    const SECONDS_PER_DAY: u32 = 86_400;
    const SECONDS_PER_HOUR: u32 = 3_600;
    const SECONDS_PER_MINUTE: u32 = 60;

    let days = uptime_secs / SECONDS_PER_DAY;
    let mut rest = uptime_secs % SECONDS_PER_DAY;
    let hours = rest / SECONDS_PER_HOUR;
    rest %= SECONDS_PER_HOUR;
    let minutes = rest / SECONDS_PER_MINUTE;
    let seconds = rest % SECONDS_PER_MINUTE;

    format!("{days}d/{hours:02}:{minutes:02}:{seconds:02}")
}
