pub mod import;
pub mod turnover;
