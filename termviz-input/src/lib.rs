//! Modal keyboard input handling for termviz

mod commands;
mod modal;

pub use commands::{Command, Mode};
pub use modal::{InputHandler, SENSITIVITY_STEP};
