#![doc = "docdeco-core: page transforms and site pipeline for docdeco."]

//! This crate holds everything that touches a rendered page: the mutable
//! document, the console block styler, the terminal mounter, and the
//! pipeline that walks a site directory through them.
//! The `docdeco` binary crate is only CLI glue on top of it.
//!
//! # Usage
//! Build a [`decorate::Decorator`] from a [`config::DecorateConfig`] and feed
//! it page sources, or hand it to [`pipeline::decorate_site`] together with a
//! [`site::FsPageStore`].

pub mod config;
pub mod console;
pub mod contract;
pub mod decorate;
pub mod document;
pub mod error;
pub mod escape;
pub mod pipeline;
pub mod site;
pub mod termy;
