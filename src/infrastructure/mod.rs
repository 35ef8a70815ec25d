pub mod classify;
pub mod config;
pub mod grid;
pub mod header;
pub mod numeric;
pub mod rewrite;
pub mod storage;
