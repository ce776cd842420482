// flame-common: wire types and helpers shared by the Flame client crates

pub mod path;
pub mod protocol;
pub mod types;
