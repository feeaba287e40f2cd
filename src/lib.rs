pub mod api;
pub mod cli;
pub mod dao;
pub mod error;
pub mod model;
pub mod service;
