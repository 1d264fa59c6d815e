//! Resolution helpers that run ahead of (or alongside) an audit: redirect
//! chain walking and robots.txt directive matching.

pub mod redirects;
pub mod robots;

pub use redirects::{check_redirects, Hop, HopFetcher, RedirectIssue, RedirectReport};
pub use robots::RobotsRules;
