pub mod digest;
pub mod filings;
