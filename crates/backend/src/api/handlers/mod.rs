// Dashboard handlers
pub mod d400_ad_stats;

// Usecase handlers
pub mod u500_aggregate_ad_stats;
