#![cfg_attr(doc, doc = include_str!("../README.md"))]

#[cfg(feature = "download")]
pub mod download;
pub mod error;
pub mod events;
pub mod frame;
pub mod monitor;
pub mod stomp;
pub mod ws;

use crate::error::Error;

pub type Result<T> = std::result::Result<T, Error>;
