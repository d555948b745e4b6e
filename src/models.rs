pub mod character;
pub mod item;
pub mod language;
pub mod server;
