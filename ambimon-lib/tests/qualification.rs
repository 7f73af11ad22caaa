//! End-to-end pipeline scenarios: encode → gain → build → qualify

mod common;

use common::*;

fn pipeline(
    qualifier: &mut MessageQualifier,
    msg_id: u32,
    timestamp: i64,
    frame: &RawFrame,
) -> Vec<JsonMessage> {
    let record = gain_record(meta(msg_id, timestamp), &frame.to_bytes()).unwrap();
    let messages = build_messages(&record).unwrap();

    messages
        .into_iter()
        .filter(|message| qualifier.qualify(message).unwrap() == Disposition::Process)
        .collect()
}

#[test]
fn test_lossless_link_drops_all_duplicates() {
    let mut encoder = PayloadEncoder::new(1);
    let mut qualifier = MessageQualifier::new();
    let mut accepted = Vec::new();

    let bootup = encoder.encode_bootup(&sample_config());
    accepted.extend(pipeline(&mut qualifier, 1, 1000, &bootup));

    for i in 0..5u32 {
        let frame = encoder.encode_data(&sample_reading(60 + i * 180));
        accepted.extend(pipeline(&mut qualifier, 2 + i, 1000 + (i as i64) * 180, &frame));
    }

    // bootup + one novel reading per frame; every Gen1/Gen2 copy is a
    // duplicate of an already delivered Gen0
    assert_eq!(accepted.len(), 6);
    assert_eq!(accepted[0].packet_type, PacketType::Bootup);
    for (i, message) in accepted[1..].iter().enumerate() {
        assert_eq!(message.packet_type, PacketType::DataGen0);
        assert_eq!(message.sequ_num, i as u32 + 1);
    }
}

#[test]
fn test_lost_frame_recovered_from_next_generation_copy() {
    let mut encoder = PayloadEncoder::new(1);
    let mut qualifier = MessageQualifier::new();
    let mut accepted = Vec::new();

    let frame1 = encoder.encode_data(&sample_reading(60));
    let _lost = encoder.encode_data(&sample_reading(240)); // lost in transit
    let frame3 = encoder.encode_data(&sample_reading(420));

    accepted.extend(pipeline(&mut qualifier, 1, 1060, &frame1));
    accepted.extend(pipeline(&mut qualifier, 2, 1420, &frame3));

    // frame3 delivers seq 2's reading as a Gen1 copy, before its own Gen0;
    // oldest-first ordering keeps history in sequence
    let sequence: Vec<u32> = accepted.iter().map(|m| m.sequ_num).collect();
    assert_eq!(sequence, vec![1, 2, 3]);
    assert_eq!(accepted[1].packet_type, PacketType::DataGen1);
    assert_eq!(accepted[2].packet_type, PacketType::DataGen0);

    // the recovered reading carries its reconstructed sample time, not the
    // receive time of the carrying frame
    let json: serde_json::Value = serde_json::from_str(&accepted[1].json_record).unwrap();
    assert_eq!(json["Uptime"], 240);
    assert_eq!(json["TimeStamp"], 1240);
    assert_eq!(json["MsgType"], "StationDataGen1");
}

#[test]
fn test_silent_station_reset_reaccepts_low_sequence() {
    let mut encoder = PayloadEncoder::new(1);
    let mut qualifier = MessageQualifier::new();

    for i in 0..4u32 {
        let frame = encoder.encode_data(&sample_reading(60 + i * 180));
        pipeline(&mut qualifier, 1 + i, 1000, &frame);
    }

    // station reboots and its bootup frame is lost; a fresh encoder
    // restarts the sequence at 1
    let mut encoder = PayloadEncoder::new(1);
    let frame = encoder.encode_data(&sample_reading(30));
    let accepted = pipeline(&mut qualifier, 10, 2000, &frame);

    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].sequ_num, 1);
}

#[test]
fn test_bootup_message_payload() {
    let encoder = PayloadEncoder::new(3);
    let mut qualifier = MessageQualifier::new();
    let frame = encoder.encode_bootup(&sample_config());

    let accepted = pipeline(&mut qualifier, 1, 1_678_546_265, &frame);
    assert_eq!(accepted.len(), 1);
    assert_eq!(
        publish_topic(&accepted[0]).unwrap(),
        "LoraAmbMon/Data/DevID003/Bootup"
    );

    let json: serde_json::Value = serde_json::from_str(&accepted[0].json_record).unwrap();
    assert_eq!(json["MsgType"], "StationBootup");
    assert_eq!(json["DevID"], 3);
    assert_eq!(json["FirmwareVer"], "1.00");
    assert_eq!(json["DataPackCycleTm"], 180);
    assert_eq!(json["CfgOledDisplay"], 1);
    assert_eq!(json["CfgAsyncLoraEvent"], 0);
    assert_eq!(json["LoraTxPower"], 14);
    assert_eq!(json["LoraSpreadFactor"], 7);
    assert_eq!(json["TimeStampFmt"], "2023/03/11 - 14:51:05");
}

#[test]
fn test_corrupt_header_blocks_message_building() {
    let mut encoder = PayloadEncoder::new(1);
    let frame = encoder.encode_data(&sample_reading(66));
    let mut bytes = frame.to_bytes();
    bytes[5] ^= 0x10; // damage the header uptime field

    let record = gain_record(meta(1, 1000), &bytes).unwrap();
    assert_eq!(build_messages(&record), Err(AmbimonError::CorruptHeader));
}

#[test]
fn test_corrupt_record_only_drops_that_generation() {
    let mut encoder = PayloadEncoder::new(1);
    encoder.encode_data(&sample_reading(60));
    let frame = encoder.encode_data(&sample_reading(240));
    let mut bytes = frame.to_bytes();
    bytes[12] ^= 0x01; // damage the Gen0 slot

    let mut qualifier = MessageQualifier::new();
    let record = gain_record(meta(1, 1000), &bytes).unwrap();
    let messages = build_messages(&record).unwrap();
    let accepted: Vec<_> = messages
        .into_iter()
        .filter(|m| qualifier.qualify(m).unwrap() == Disposition::Process)
        .collect();

    // only the intact Gen1 copy survives
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].packet_type, PacketType::DataGen1);
    assert_eq!(accepted[0].sequ_num, 1);
}
