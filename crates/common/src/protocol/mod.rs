pub mod jsonrpc;
pub mod methods;
