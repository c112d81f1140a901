pub mod dto;
pub mod rpc;
