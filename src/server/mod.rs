//! Server role: the listener and the file-access capability it serves from.

pub mod listener;
pub mod resolver;

pub use listener::{Listener, ListenerError, ListenerSettings};
pub use resolver::{FsResolver, MemoryResolver, Resolution, Resolver};
