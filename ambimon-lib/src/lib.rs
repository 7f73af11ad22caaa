//! Over-the-air telemetry codec for battery-powered ambient sensor
//! stations.
//!
//! Implements both sides of the fixed 40-byte radio frame: the station-side
//! [`encoder::PayloadEncoder`] with its 3-generation redundancy ring, and
//! the gateway-side decode → reconstruct → qualify pipeline
//! ([`decoder`], [`processor`], [`qualifier`]) that survives a lossy,
//! duplicate-prone link without an acknowledgment protocol.

pub mod codec;
pub mod constants;
pub mod crc;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod packet;
pub mod processor;
pub mod qualifier;

pub use decoder::{DataStatus, StationBootup, StationData, decode_bootup, decode_data};
pub use encoder::{DeviceConfig, PayloadEncoder, SensorReading};
pub use error::AmbimonError;
pub use packet::{PacketType, RawFrame};
pub use processor::{
    JsonMessage, LoraRecord, RxMetadata, StationRecord, build_messages, build_telemetry,
    gain_record, publish_topic,
};
pub use qualifier::{Disposition, MessageQualifier};
