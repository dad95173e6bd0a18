pub mod export;
pub mod size;
pub mod slack;
