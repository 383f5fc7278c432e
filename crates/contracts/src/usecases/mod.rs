pub mod u500_aggregate_ad_stats;
