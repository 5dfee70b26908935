mod list;
mod root;

pub use root::Cli;
