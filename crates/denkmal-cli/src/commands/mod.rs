pub mod params;
pub mod projection;
