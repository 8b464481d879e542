//! Command Processor Module
//!
//! Interprets a stream of tagged messages against the database.
//!
//! ## Message Stream
//! Each item is a [`Message`]: a [`Tag`] (`{tag, msg}`), a plain value, or
//! the absent marker. Tags starting with `<` are reserved commands:
//!
//! | Tag          | Payload | Effect                                          |
//! |--------------|---------|-------------------------------------------------|
//! | `<keys>`     | prefix  | echo, then one item per child segment           |
//! | `<get>`      | key     | echo, then the value or the absent marker       |
//! | `<clear>`    | prefix  | delete every key under prefix                   |
//! | `<range>`    | prefix  | echo, then one `{key, value}` tag per entry     |
//! | `<register>` | key     | record the stored payload as a definition       |
//! | other `<..>` | any     | passed through unchanged                        |
//!
//! Any other tag is a write of `msg` to the key named by the tag. Plain
//! values and the absent marker are forwarded untouched.

mod command;
mod message;
mod dispatch;
mod registry;

pub use command::{Command, RESERVED_MARKER};
pub use message::{Message, Tag};
pub use dispatch::CommandProcessor;
pub use registry::{Definition, DefinitionRegistry};
