//! `reach-launch`: fill the SMS campaign wizard from a JSON file and launch.

pub mod args;
pub mod campaign_file;
pub mod run;
