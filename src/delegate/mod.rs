//! Delegates that carry transport callbacks back to the request object

pub(crate) mod relay;

pub(crate) use relay::{CallbackRelay, EventQueue, TransportEvent, channel};
