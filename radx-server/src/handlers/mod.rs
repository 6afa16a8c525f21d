pub mod detect;
pub mod scans;
