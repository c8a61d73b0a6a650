pub mod core_api;
pub mod field_tree;
pub mod hasher;
pub mod primitive;
pub mod projection;
pub mod record;
pub mod table;
