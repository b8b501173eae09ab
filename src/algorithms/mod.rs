//! Position solving algorithms

pub mod multilateration;
pub mod trilateration;

pub use multilateration::multilaterate;
pub use trilateration::trilaterate;
