pub mod cache;
pub mod monitor;
pub mod stabilizer;
