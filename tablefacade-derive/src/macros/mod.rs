//! Macro implementations

pub mod table_entity;

pub use table_entity::derive_table_entity;
