pub mod weekly_trend_digest;
