mod batch_runner;
mod batch_service;
mod dispatcher;
mod error;
mod handlers;
mod registry;
mod selector;

pub use batch_runner::*;
pub use batch_service::*;
pub use dispatcher::*;
pub use error::*;
pub use handlers::*;
pub use registry::*;
pub use selector::*;
