pub mod d400_ad_stats;

pub use d400_ad_stats::ui::AdStatsDashboard;
