pub mod metrics;
pub mod track;
