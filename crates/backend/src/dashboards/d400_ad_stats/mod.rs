pub mod filters;
pub mod repository;
pub mod service;
