#[cfg(feature = "folder-picker")]
pub mod folder_picker;
pub mod packer;
