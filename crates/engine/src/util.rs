pub mod events;
pub mod msg_buffer;
pub mod timers;
