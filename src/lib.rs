//! Postwatch - a live, queryable index over a directory of blog posts.
//!
//! The posts directory is scanned once into a [`index::PostStore`]; the
//! [`watch`] module then keeps it in sync with the filesystem while readers
//! query it concurrently.

pub mod cli;
pub mod config;
pub mod index;
pub mod post;
pub mod utils;
pub mod watch;
