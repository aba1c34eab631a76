pub mod aqi;
pub mod policy;
