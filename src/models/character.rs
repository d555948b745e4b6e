/// One character folder under the game's USER directory. `id` is the opaque
/// on-disk folder name; `name` is the user-editable display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Character {
    pub id: String,
    pub name: String,
}

impl Character {
    pub fn new(id: impl Into<String>) -> Character {
        let id = id.into();
        Character { name: id.clone(), id }
    }

    /// True when the display name is just the folder id again, meaning the
    /// persisted override can be dropped.
    pub fn has_default_name(&self) -> bool {
        self.name.is_empty() || self.name == self.id
    }
}

/// One named inventory container ("Inventory", "Mog Safe", ...). `file_name`
/// is the save file inside the character folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabInfo {
    pub file_name: String,
    pub display_name: String,
}
