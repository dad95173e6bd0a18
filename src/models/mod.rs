pub mod chart;
pub mod usage;
