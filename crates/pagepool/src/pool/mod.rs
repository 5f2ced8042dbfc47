pub mod arena;
pub mod global;
pub mod linked_pool;

pub use global::GlobalPools;
pub use linked_pool::LinkedPool;
