#![forbid(unsafe_code)]

pub mod model;
pub mod scoring;
pub mod time;

pub use scoring::Scorecard;
pub use time::Clock;
