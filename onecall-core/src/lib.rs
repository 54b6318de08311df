//! Core library for the OneCall agents.
//!
//! This crate defines:
//! - Options handling & validation for both agents
//! - The event model shared with the host runtime
//! - The polling agent (Fetcher) and the payload stringifier
//!
//! It is used by `onecall-cli`, but can also be embedded by a host runtime
//! that supplies its own scheduling and event delivery.

pub mod agent;
pub mod config;
pub mod event;
pub mod stringify;

pub use agent::{Agent, WeatherFetcher, WeatherStringifier};
pub use config::{Config, FetcherOptions, FetcherSettings, Mode, StringifierOptions, Units};
pub use event::{AgentStatus, Event, EventBuffer, EventSink};
