#![doc = "ytpa-core: the playlist aggregation engine behind the ytpa CLI."]

//! This crate holds everything that decides *what* gets appended *where*:
//! feed pagination, playlist lookup by name, the two video readers and the
//! driver that ties them together. It never talks to the network itself;
//! remote access comes in through the capability traits in [`contract`].
//!
//! # Usage
//! Implement [`contract::FeedSource`] and [`contract::PlaylistWriter`] for a
//! transport (the CLI crate ships an HTTP one) and call
//! [`aggregate::aggregate`] with an [`aggregate::AggregateRequest`].

pub mod aggregate;
pub mod contract;
pub mod error;
pub mod identifier;
pub mod paginator;
pub mod reader;
pub mod resolver;
