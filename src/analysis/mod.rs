pub mod activity;
pub mod developers;
pub mod highlights;
pub mod join;
pub mod normalization;
pub mod recency;
pub mod trend;
