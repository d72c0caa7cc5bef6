use super::day_io::{StoreError, read_json, write_json};
use super::paths::DataPaths;
use crate::model::Inventory;

/// Cached inventory; missing file means nothing to pick from.
pub fn load_inventory(paths: &DataPaths) -> Result<Inventory, StoreError> {
    read_json(&paths.inventory_file())
}

pub fn save_inventory(paths: &DataPaths, inventory: &Inventory) -> Result<(), StoreError> {
    write_json(paths, &paths.inventory_file(), inventory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InventorySource, InventoryTask};
    use tempfile::TempDir;

    #[test]
    fn assigned_flags_persist() {
        let tmp = TempDir::new().unwrap();
        let paths = DataPaths::new(tmp.path());
        assert_eq!(load_inventory(&paths).unwrap(), Inventory::default());

        let mut inventory = Inventory::default();
        inventory.backlog.push(InventoryTask {
            id: "bl-1".into(),
            title: "Renew passport".into(),
            duration_min: 20,
            project_id: None,
            assigned: false,
        });
        inventory.set_assigned(InventorySource::Backlog, "bl-1", true);
        save_inventory(&paths, &inventory).unwrap();
        let back = load_inventory(&paths).unwrap();
        assert!(back.backlog[0].assigned);
    }
}
