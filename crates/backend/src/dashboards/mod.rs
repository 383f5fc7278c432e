pub mod d400_ad_stats;
