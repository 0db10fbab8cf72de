mod backoff;
mod heartbeat;
mod timer;
mod worker;

pub(crate) use worker::{Command, Worker};
