pub mod domain;
pub mod event_worker;
pub mod queue;

pub use domain::*;
pub use event_worker::*;
pub use queue::*;
