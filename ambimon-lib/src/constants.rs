// Wire-format constants for the ambient station telemetry protocol

/// Size of one packed segment: 64 field bits plus the trailing CRC16 (10 bytes)
pub const SEGMENT_SIZE: usize = 10;

/// Number of bytes covered by a segment CRC (the 64-bit field block)
pub const CRC_SPAN: usize = 8;

/// Number of generation record slots carried in every frame
pub const RECORD_SLOTS: usize = 3;

/// Fixed over-the-air frame size: header segment plus 3 record slots (40 bytes)
pub const FRAME_SIZE: usize = SEGMENT_SIZE + RECORD_SLOTS * SEGMENT_SIZE;

/// Highest device id representable in the 4-bit wire field, plus one
pub const MAX_DEVICES: usize = 16;

/// Default depth of the per-device sequence-number history
pub const DEFAULT_HISTORY_DEPTH: usize = 10;

/// Uptime snippets count in steps of this many seconds
pub const SNIPPET_STEP_SECS: u32 = 10;

/// Uptime snippets wrap at 2^12 steps (about 11.4 hours)
pub const SNIPPET_MASK: u32 = 0x0FFF;

/// Wire sequence numbers wrap at 2^24
pub const SEQU_NUM_MASK: u32 = 0x00FF_FFFF;
