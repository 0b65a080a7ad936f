//! Subfetch - YouTube transcripts as SBV subtitle files
//!
//! Signs in to Firebase Authentication with email and password, calls the
//! `runTranscript` cloud function with the user's ID token, and saves the
//! returned SBV content locally.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod identity;
pub mod remote;
pub mod shell;
pub mod ui;
