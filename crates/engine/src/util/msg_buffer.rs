use std::collections::VecDeque;

use chronobft_core_types::Context;
use tracing::{debug, warn};

use crate::consensus::ConsensusMsg;

/// Bounded FIFO of messages which arrived before the height they are for was started.
pub struct MessageBuffer<Ctx: Context> {
    messages: VecDeque<ConsensusMsg<Ctx>>,
    max_size: usize,
}

impl<Ctx: Context> MessageBuffer<Ctx> {
    pub fn new(max_size: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            max_size,
        }
    }

    pub fn buffer(&mut self, msg: ConsensusMsg<Ctx>) -> bool {
        if self.messages.len() < self.max_size {
            debug!("Buffering message: {msg:?}");
            self.messages.push_back(msg);
            true
        } else {
            warn!("Buffer is full, dropping message: {msg:?}");
            false
        }
    }

    /// Take all the buffered messages out, in the order they were received.
    pub fn drain(&mut self) -> VecDeque<ConsensusMsg<Ctx>> {
        std::mem::take(&mut self.messages)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }
}
