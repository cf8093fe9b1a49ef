//! Engine runtime: the tick scheduler and its time sources.

pub mod clock;
pub mod engine;
