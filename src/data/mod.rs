pub mod codec;
pub mod fields;
pub mod models;
pub mod resolver;
pub mod rows;
