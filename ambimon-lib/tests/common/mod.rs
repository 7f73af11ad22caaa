//! Common test utilities and shared imports

// Allow unused imports and dead code since this is a shared module
// used across multiple test files - not all items are used in every test file
#[allow(unused_imports)]
pub use ambimon_lib::decoder::{DataStatus, StationBootup, StationData, decode_bootup, decode_data};
#[allow(unused_imports)]
pub use ambimon_lib::encoder::{DeviceConfig, PayloadEncoder, SensorReading};
#[allow(unused_imports)]
pub use ambimon_lib::error::AmbimonError;
#[allow(unused_imports)]
pub use ambimon_lib::packet::{BootupHeader, DataHeader, DataRecord, PacketType, RawFrame};
#[allow(unused_imports)]
pub use ambimon_lib::processor::{
    JsonMessage, LoraRecord, RxMetadata, StationRecord, build_messages, build_telemetry,
    gain_record, publish_topic, reconstruct,
};
#[allow(unused_imports)]
pub use ambimon_lib::qualifier::{Disposition, MessageQualifier};
#[allow(unused_imports)]
pub use bytes::Bytes;
#[allow(unused_imports)]
pub use hex;

/// Decode hex string to bytes for testing
#[allow(dead_code)]
pub fn hex_to_bytes(hex_data: &str) -> Bytes {
    Bytes::from(hex::decode(hex_data).expect("Failed to decode hex"))
}

/// Bootup frame for device 3: fw 1.00, cycle 180 s, OLED/DHT/SR501/light/
/// battery on, async off, SR501-pause on, commissioning off, TxPower 14,
/// SF 7. Header CRC 0x475F; record slots all zero.
#[allow(dead_code)]
pub const BOOTUP_FRAME_DEV3: &str =
    "310100b4005f0e075f47000000000000000000000000000000000000000000000000000000000000";

/// Data frame for device 1: seq 1, uptime 66 s, one Gen0 record
/// (23.5 degC, 41 %, motion active 360 s / 64 events, light 60 %, 11.5 V),
/// older slots unused.
#[allow(dead_code)]
pub const DATA_FRAME_DEV1_SEQ1: &str =
    "12010000420000003b5063002fa924407873c0ab0000000000000000000000000000000000000000";

#[allow(dead_code)]
pub fn sample_config() -> DeviceConfig {
    DeviceConfig {
        firmware_version: 1,
        firmware_revision: 0,
        data_pack_cycle_tm: 180,
        cfg_oled_display: true,
        cfg_dht_sensor: true,
        cfg_sr501_sensor: true,
        cfg_adc_light_sensor: true,
        cfg_adc_car_bat_ain: true,
        cfg_async_lora_event: false,
        sr501_pause_on_lora_tx: true,
        commissioning_mode: false,
        lora_tx_power: 14,
        lora_spread_factor: 7,
    }
}

#[allow(dead_code)]
pub fn sample_reading(uptime: u32) -> SensorReading {
    SensorReading {
        uptime,
        temperature: 23.5,
        humidity: 41.0,
        motion_active: true,
        motion_active_time: 360,
        motion_active_count: 64,
        light_level: 60,
        car_batt_level: 11.5,
    }
}

#[allow(dead_code)]
pub fn meta(msg_id: u32, timestamp: i64) -> RxMetadata {
    RxMetadata {
        msg_id,
        timestamp,
        rssi: -56,
    }
}
