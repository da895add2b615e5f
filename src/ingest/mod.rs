pub mod alt_cache;
pub mod pending_tx;
pub mod stream;
