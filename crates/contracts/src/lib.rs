pub mod dashboards;
pub mod usecases;
