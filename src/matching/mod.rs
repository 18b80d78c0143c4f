pub mod ai;
pub mod compress;
pub mod fallback;
pub mod mapping_model;
pub mod similarity;
