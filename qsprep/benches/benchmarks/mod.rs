pub mod generators;
pub mod prepare;
pub mod solver;
