pub mod dashboard;
pub mod view_model;

pub use dashboard::AdStatsDashboard;
