#![cfg_attr(doc, doc = include_str!("../README.md"))]

pub mod auth;
pub mod error;
pub mod rtds;
pub mod types;
pub mod ws;

use crate::error::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Unix timestamp as carried by RTDS frames (milliseconds for envelopes and prices)
pub(crate) type Timestamp = i64;
