pub mod all_models;

pub use all_models::*;
