//! Core types and trait definitions for the dramwh warehouse.
//!
//! This crate is deliberately free of database and HTTP dependencies. It
//! declares the schema (entity descriptors and row structs), the
//! [`store::WarehouseStore`] abstraction backends implement, and the pure
//! calendar and region normalisation used by the reconcilers.

// Native `async fn` in traits; `Send` bounds are spelled out on the trait.
#![allow(async_fn_in_trait)]

pub mod calendar;
pub mod dimension;
pub mod entity;
pub mod error;
pub mod fact;
pub mod index;
pub mod region;
pub mod schema;
pub mod store;
pub mod value;

pub use error::{Error, Result};
pub use value::{Fields, Value};
