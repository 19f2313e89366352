pub mod dir_exist;
pub mod file_exist;
pub mod header_name;
pub mod human_bytes;
pub mod url;
