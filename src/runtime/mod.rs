//! Container-runtime selection and invocation construction.

mod backend;
mod invocation;
mod resolver;

pub use backend::RuntimeBackend;
pub use invocation::{wait_with_timeout, Invocation};
pub use resolver::RuntimeResolver;
