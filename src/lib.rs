pub mod actions;
pub mod api;
pub mod app;
pub mod args;
pub mod catalog;
pub mod detection;
pub mod env;
pub mod model;
pub mod utils;
pub mod view;
