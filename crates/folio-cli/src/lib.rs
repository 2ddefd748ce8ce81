//! Terminal editor for folio documents.
//!
//! A line-oriented shell over [`folio_client::EditorSession`]. Every edit
//! goes through the same history, reordering and sync paths a graphical
//! editor would use, so the shell doubles as a way to poke at them by hand.

pub mod command;
pub mod constants;
pub mod render;
pub mod shell;

pub use command::{Command, CommandError};
pub use shell::{Flow, Shell};
