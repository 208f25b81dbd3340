//! bfsviz: instrumented breadth-first search for step-by-step walkthroughs.
//!
//! The [`domain`] layer builds graphs and turns a traversal into an ordered
//! event log; [`application`] loads scenes and paces the log into frames;
//! [`cli`] prints them.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod util;
