pub mod repository;
pub mod rpc;
