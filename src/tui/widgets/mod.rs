pub mod dashboard;
pub mod schedule;
pub mod topic_detail;
pub mod topics;
