pub mod manager;
pub mod model;
mod naming;

pub use manager::{load_descriptor, BuildStore, BUILD_FILE};
pub use model::{BuildDescriptor, LoaderType};
pub use naming::{sanitize_dir_name, unique_dir_name};
