pub mod housing;
pub mod zoning;
