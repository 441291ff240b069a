pub mod apply;
pub mod cli;
pub mod error;
pub mod parse;
pub mod plan;
pub mod store;
pub mod token;
pub mod validate;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
