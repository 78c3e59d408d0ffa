pub mod fetch;
pub mod merge;
pub mod synthetic;
pub mod window;
