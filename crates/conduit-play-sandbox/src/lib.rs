//! Conduit playground sandbox.
//!
//! Runs generated host scripts in a tree-walking interpreter with mock
//! framework objects (`Conduit`, `MCPServer`). Output goes to an explicit
//! [`OutputSink`]; runaway scripts stop at a step budget or call-depth limit.

pub mod builtins;
pub mod env;
pub mod error;
pub mod framework;
mod heap;
pub mod interpreter;
mod methods;
pub mod output;
pub mod sandbox;
pub mod script;
pub mod value;

pub use error::{SandboxError, SandboxResult};
pub use interpreter::Interpreter;
pub use output::{BufferSink, OutputSink};
pub use sandbox::{Sandbox, SandboxConfig};
pub use value::{HostObject, Value};
