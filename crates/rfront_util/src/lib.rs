pub mod pool;

pub use pool::{Handle, Pool};
