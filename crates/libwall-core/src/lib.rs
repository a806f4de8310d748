//! Core types and operations for libwall comment walls.
//!
//! A wall is an append-only comment feed attached to a location
//! `(context, component, area, item)`. This crate owns the sequence-number
//! allocation and range-loading protocol; persistence and user lookup are
//! reached through the [`store::WallStore`] and [`user::UserDirectory`] ports.
//!
//! The crate has no HTTP or database dependencies.

#![allow(async_fn_in_trait)]

pub mod allocator;
pub mod comment;
pub mod directory;
pub mod error;
pub mod export;
pub mod loader;
pub mod service;
pub mod store;
pub mod user;
pub mod wall;

pub use error::{Error, Result};
pub use service::WallService;
