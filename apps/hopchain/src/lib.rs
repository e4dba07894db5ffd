//! # hopchain
//!
//! Service layer for the hopchain solve engine: HTTP API, CLI, the
//! collaborator clients, and the async attempt/finalize flow built on
//! `hopchain-core`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   apps/hopchain (THE BINARY)                │
//! │                                                             │
//! │  ┌───────────┐   ┌───────────┐   ┌───────────────────────┐  │
//! │  │   CLI     │   │ HTTP API  │   │ Hops / Games clients  │  │
//! │  │  (clap)   │   │  (axum)   │   │      (reqwest)        │  │
//! │  └─────┬─────┘   └─────┬─────┘   └───────────┬───────────┘  │
//! │        └───────────────┼─────────────────────┘              │
//! │                        ▼                                    │
//! │                 ┌──────────────┐                            │
//! │                 │    engine    │                            │
//! │                 └──────┬───────┘                            │
//! │                        ▼                                    │
//! │                 ┌──────────────┐                            │
//! │                 │hopchain-core │                            │
//! │                 └──────────────┘                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod cli;
pub mod collaborators;
pub mod config;
pub mod engine;
