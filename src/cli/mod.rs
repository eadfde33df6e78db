//! Download tool interface: process spawning, argument building, output
//! streaming and line classification.

mod args;
mod events;
mod parser;
mod process;
mod stream;

pub use args::*;
pub use events::*;
pub use parser::*;
pub use process::*;
pub use stream::*;
