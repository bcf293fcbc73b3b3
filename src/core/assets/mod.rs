mod asset_index;

pub use asset_index::{AssetIndex, AssetObject, AssetSynchronizer, ASSETS_LABEL, RESOURCES_URL};
