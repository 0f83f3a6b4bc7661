pub mod activity_score;
pub mod combined;
pub mod developer;
pub mod project;
pub mod report;
pub mod transaction;
