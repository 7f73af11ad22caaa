//! Station-side payload encoder.
//!
//! Holds the device id, the rolling sequence counter and the current data
//! frame, which doubles as a 3-deep generation ring: every `encode_data`
//! call shifts the previous readings one slot down before writing the new
//! one into slot 0. A single lost frame therefore costs no data, the next
//! frame repeats the reading in its Gen1 slot.

use crate::codec::{float_to_i8, float_to_u7, float_to_u8};
use crate::constants::{SEQU_NUM_MASK, SNIPPET_MASK, SNIPPET_STEP_SECS};
use crate::packet::{BootupHeader, DataHeader, DataRecord, PacketType, RawFrame};
use tracing::debug;

/// Static device configuration announced in a bootup frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceConfig {
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
}

/// One sensor sample in engineering units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorReading {
    /// Station uptime in seconds at sample time
    pub uptime: u32,
    /// degC, clamped to the -64.0..63.5 wire range
    pub temperature: f32,
    /// percent, clamped to 0..100
    pub humidity: f32,
    pub motion_active: bool,
    /// seconds, encoded on a 10-second grid
    pub motion_active_time: u16,
    pub motion_active_count: u16,
    /// percent, encoded in 2 percent steps
    pub light_level: u8,
    /// volts, encoded in 0.1 V steps
    pub car_batt_level: f32,
}

/// Builds the over-the-air frames for one station
#[derive(Debug, Clone)]
pub struct PayloadEncoder {
    dev_id: u8,
    sequ_num: u32,
    records: [DataRecord; 3],
}

impl PayloadEncoder {
    pub fn new(dev_id: u8) -> Self {
        PayloadEncoder {
            dev_id,
            sequ_num: 0,
            records: [DataRecord::new(); 3],
        }
    }

    /// Current value of the rolling sequence counter
    pub fn sequ_num(&self) -> u32 {
        self.sequ_num
    }

    /// Build a bootup frame announcing the device configuration.
    ///
    /// The three record slots stay zeroed; receivers classify them as
    /// unused.
    pub fn encode_bootup(&self, config: &DeviceConfig) -> RawFrame {
        let header = BootupHeader::new()
            .with_packet_type(PacketType::Bootup.into())
            .with_dev_id(self.dev_id & 0x0F)
            .with_firmware_version(config.firmware_version)
            .with_firmware_revision(config.firmware_revision)
            .with_data_pack_cycle_tm(config.data_pack_cycle_tm)
            .with_cfg_oled_display(config.cfg_oled_display)
            .with_cfg_dht_sensor(config.cfg_dht_sensor)
            .with_cfg_sr501_sensor(config.cfg_sr501_sensor)
            .with_cfg_adc_light_sensor(config.cfg_adc_light_sensor)
            .with_cfg_adc_car_bat_ain(config.cfg_adc_car_bat_ain)
            .with_cfg_async_lora_event(config.cfg_async_lora_event)
            .with_sr501_pause_on_lora_tx(config.sr501_pause_on_lora_tx)
            .with_commissioning_mode(config.commissioning_mode)
            .with_lora_tx_power(config.lora_tx_power)
            .with_lora_spread_factor(config.lora_spread_factor)
            .seal();

        let mut frame = RawFrame::zeroed();
        frame.header = header.into_bytes();
        frame
    }

    /// Build a data frame carrying the new reading plus up to two
    /// retransmitted older generations.
    pub fn encode_data(&mut self, reading: &SensorReading) -> RawFrame {
        self.sequ_num = self.sequ_num.wrapping_add(1);

        let header = DataHeader::new()
            .with_packet_type(PacketType::DataHeader.into())
            .with_dev_id(self.dev_id & 0x0F)
            .with_sequ_num(self.sequ_num & SEQU_NUM_MASK)
            .with_uptime(reading.uptime)
            .seal();

        // shift the generation ring ([1] -> [2], [0] -> [1]); a slot is
        // only re-tagged and re-sealed when it actually carried the prior
        // generation, so stale buffer contents never turn into history
        self.records[2] = self.records[1];
        if self.records[2].packet_type() == u8::from(PacketType::DataGen1) {
            self.records[2].set_packet_type(PacketType::DataGen2.into());
            self.records[2] = self.records[2].seal();
        }
        self.records[1] = self.records[0];
        if self.records[1].packet_type() == u8::from(PacketType::DataGen0) {
            self.records[1].set_packet_type(PacketType::DataGen1.into());
            self.records[1] = self.records[1].seal();
        }

        self.records[0] = DataRecord::new()
            .with_packet_type(PacketType::DataGen0.into())
            .with_uptime_snippet(((reading.uptime / SNIPPET_STEP_SECS) & SNIPPET_MASK) as u16)
            .with_temperature(float_to_i8(reading.temperature * 2.0))
            .with_humidity(float_to_u7(reading.humidity))
            .with_motion_active(reading.motion_active)
            .with_motion_active_time((((reading.motion_active_time as u32) + 5) / 10) as u8)
            .with_motion_active_count(reading.motion_active_count & 0x03FF)
            .with_light_level((reading.light_level / 2) & 0x3F)
            .with_car_batt_level(float_to_u8(reading.car_batt_level * 10.0))
            .seal();

        debug!(
            dev_id = self.dev_id,
            sequ_num = self.sequ_num,
            uptime = reading.uptime,
            "encoded data frame"
        );

        let mut frame = RawFrame::zeroed();
        frame.header = header.into_bytes();
        for (slot, record) in frame.records.iter_mut().zip(self.records.iter()) {
            *slot = record.into_bytes();
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(uptime: u32, temperature: f32) -> SensorReading {
        SensorReading {
            uptime,
            temperature,
            humidity: 41.0,
            motion_active: true,
            motion_active_time: 360,
            motion_active_count: 6,
            light_level: 60,
            car_batt_level: 11.5,
            ..Default::default()
        }
    }

    #[test]
    fn test_first_encode_leaves_older_slots_unused() {
        let mut encoder = PayloadEncoder::new(1);
        let frame = encoder.encode_data(&reading(66, 23.5));

        assert_eq!(frame.packet_type(), PacketType::DataHeader);
        assert_eq!(frame.records[0][0] & 0x0F, u8::from(PacketType::DataGen0));
        assert_eq!(frame.records[1], [0u8; 10]);
        assert_eq!(frame.records[2], [0u8; 10]);
    }

    #[test]
    fn test_ring_shift_over_three_encodes() {
        let mut encoder = PayloadEncoder::new(1);
        encoder.encode_data(&reading(66, 23.5));
        encoder.encode_data(&reading(241, 24.0));
        let frame = encoder.encode_data(&reading(426, 24.5));

        assert_eq!(frame.records[0][0] & 0x0F, u8::from(PacketType::DataGen0));
        assert_eq!(frame.records[1][0] & 0x0F, u8::from(PacketType::DataGen1));
        assert_eq!(frame.records[2][0] & 0x0F, u8::from(PacketType::DataGen2));

        // each slot carries a freshly sealed CRC
        for slot in frame.records.iter() {
            let record = DataRecord::from_bytes(*slot);
            assert!(record.crc_ok());
        }

        // slot 2 still carries the first reading's snippet (66 / 10 = 6)
        let gen2 = DataRecord::from_bytes(frame.records[2]);
        assert_eq!(gen2.uptime_snippet(), 6);
        // slot 1 the second (241 / 10 = 24)
        let gen1 = DataRecord::from_bytes(frame.records[1]);
        assert_eq!(gen1.uptime_snippet(), 24);
    }

    #[test]
    fn test_sequence_counter_masked_to_24_bits() {
        let mut encoder = PayloadEncoder::new(2);
        encoder.sequ_num = 0x00FF_FFFF;
        let frame = encoder.encode_data(&reading(100, 20.0));

        let header = DataHeader::from_bytes(frame.header);
        // counter wrapped silently into the 24-bit wire domain
        assert_eq!(header.sequ_num(), 0);
        assert_eq!(encoder.sequ_num(), 0x0100_0000);
    }

    #[test]
    fn test_bootup_frame_keeps_record_slots_cleared() {
        let encoder = PayloadEncoder::new(3);
        let config = DeviceConfig {
            firmware_version: 1,
            data_pack_cycle_tm: 180,
            cfg_oled_display: true,
            cfg_dht_sensor: true,
            cfg_sr501_sensor: true,
            cfg_adc_light_sensor: true,
            cfg_adc_car_bat_ain: true,
            sr501_pause_on_lora_tx: true,
            lora_tx_power: 14,
            lora_spread_factor: 7,
            ..Default::default()
        };
        let frame = encoder.encode_bootup(&config);

        assert_eq!(frame.packet_type(), PacketType::Bootup);
        assert_eq!(frame.dev_id(), 3);
        assert_eq!(frame.records, [[0u8; 10]; 3]);
        assert!(BootupHeader::from_bytes(frame.header).crc_ok());
    }
}
