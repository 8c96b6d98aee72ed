//! SeaORM entities.

pub mod content_item;
