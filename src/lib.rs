//! chatterd — minimal periodic pub/sub publisher daemon
//!
//! This crate implements a leaf producer: on a fixed timer cadence it builds
//! a `"hello world <n>"` message with a monotonically increasing counter,
//! logs the emission, and enqueues the text on a named MQTT topic
//! (`chatter` by default). It subscribes to nothing and promises nothing
//! about delivery — retries and backpressure are the transport's concern.
//!
//! ## Modules
//!
//! * `config` — Configuration structures, loading, validation, and defaults.
//!   TOML files with validation via the `validator` crate; built-in defaults
//!   when no file is present.
//!
//! * `core` — Core runtime components:
//!   - The periodic publisher (timer loop, sequence counter, message
//!     formatting)
//!   - Readiness state management bridging transport connectivity
//!
//! * `logger` — Centralized logging initialization using `tracing`.
//!   Console output in multiple formats (compact, pretty, JSON) and optional
//!   systemd journald integration.
//!
//! The MQTT transport itself lives in the `chatterd-mqtt` workspace crate.

pub mod config;
pub mod core;
pub mod logger;
