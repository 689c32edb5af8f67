pub mod cli;
pub mod config;
pub mod disks;
pub mod driver;
pub mod enclosure;
pub mod error;
pub mod extract;
pub mod fans;
pub mod output;
pub mod scan;
pub mod section;
