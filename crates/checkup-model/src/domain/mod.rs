mod data;
pub use data::ConfigData;

mod env;
pub use env::{Env, env_safe_name};

mod kv;
pub use kv::KeyValue;

pub mod keys;
