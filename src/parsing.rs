pub mod inventory;

pub use inventory::{InventoryParser, SaveFileParser};
