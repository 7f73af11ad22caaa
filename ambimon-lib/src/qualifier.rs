//! Duplicate filtering for the generation-redundant radio link.
//!
//! Every data frame repeats the two previous readings, so most Gen1/Gen2
//! messages duplicate something already delivered as Gen0. The qualifier
//! keeps a short per-device history of accepted absolute sequence numbers
//! and drops copies it has already seen. This is a best-effort heuristic:
//! a gap larger than the history depth can age a number out and let a late
//! copy through, which is an accepted trade-off on this link.

use crate::constants::{DEFAULT_HISTORY_DEPTH, MAX_DEVICES};
use crate::error::AmbimonError;
use crate::packet::PacketType;
use crate::processor::JsonMessage;
use std::collections::VecDeque;
use strum_macros::Display;
use tracing::debug;

/// Outcome of qualifying one message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Disposition {
    /// Novel message, hand it to publish/log
    Process,
    /// Duplicate of an already delivered reading, drop it
    Ignore,
}

/// Per-device sliding window over recently accepted sequence numbers
#[derive(Debug, Clone)]
pub struct MessageQualifier {
    depth: usize,
    histories: Vec<VecDeque<u32>>,
}

impl MessageQualifier {
    pub fn new() -> Self {
        Self::with_history_depth(DEFAULT_HISTORY_DEPTH)
    }

    /// The default depth of 10 matches the expected radio duty cycle; only
    /// deviate from it with evidence from the deployment.
    pub fn with_history_depth(depth: usize) -> Self {
        MessageQualifier {
            depth,
            histories: (0..MAX_DEVICES).map(|_| VecDeque::new()).collect(),
        }
    }

    /// Decide whether `message` is to be processed or ignored.
    ///
    /// Bootup clears the device's history (a reset invalidates all prior
    /// sequence context) and is always processed. Gen0 is always processed:
    /// it is the newest reading and never a duplicate; a sequence number
    /// below the highest seen means the device rebooted without a
    /// detectable bootup frame, which also clears the history. Gen1/Gen2
    /// are processed only when their sequence number is not in the history,
    /// the loss-recovery path for readings whose Gen0 frame went missing.
    pub fn qualify(&mut self, message: &JsonMessage) -> Result<Disposition, AmbimonError> {
        let dev = message.dev_id as usize;
        if dev >= MAX_DEVICES {
            return Err(AmbimonError::InvalidDeviceId(message.dev_id));
        }

        match message.packet_type {
            PacketType::Bootup => {
                debug!(dev_id = message.dev_id, "bootup, clearing sequence history");
                self.histories[dev].clear();
                Ok(Disposition::Process)
            }
            PacketType::DataGen0 => {
                let highest = self.histories[dev].iter().max().copied().unwrap_or(0);
                if message.sequ_num < highest {
                    debug!(
                        dev_id = message.dev_id,
                        sequ_num = message.sequ_num,
                        highest,
                        "sequence regression, assuming device reset"
                    );
                    self.histories[dev].clear();
                }
                self.append(dev, message.sequ_num);
                Ok(Disposition::Process)
            }
            PacketType::DataGen1 | PacketType::DataGen2 => {
                if self.histories[dev].contains(&message.sequ_num) {
                    debug!(
                        dev_id = message.dev_id,
                        sequ_num = message.sequ_num,
                        "duplicate generation copy"
                    );
                    Ok(Disposition::Ignore)
                } else {
                    self.append(dev, message.sequ_num);
                    Ok(Disposition::Process)
                }
            }
            other => Err(AmbimonError::UnexpectedPacketType(other)),
        }
    }

    fn append(&mut self, dev: usize, sequ_num: u32) {
        let history = &mut self.histories[dev];
        if history.len() == self.depth {
            history.pop_front();
        }
        history.push_back(sequ_num);
    }
}

impl Default for MessageQualifier {
    fn default() -> Self {
        Self::new()
    }
}
