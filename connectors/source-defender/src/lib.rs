//! Alert source for the Microsoft Defender for Endpoint alerts API.
//!
//! [`DefenderClient`] authenticates with the OAuth2 client-credentials flow
//! and lists alerts either with an OData `$filter` expression or with the
//! API's own selection parameters ([`FetchParams`]).

#![warn(clippy::pedantic)]

mod auth;
pub mod client;
pub mod config;
pub mod params;
mod response;

pub use client::DefenderClient;
pub use config::ClientSettings;
pub use params::{FetchParams, FetchQuery, ParamsError};
