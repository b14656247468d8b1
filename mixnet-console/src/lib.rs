//! Mixnet Console - operator console for a mix-network node management service
//!
//! Polls the admin service for node connection state, keeps a registry of the
//! last-known node descriptors, renders per-node detail panes and submits
//! operator commands through form posts.

pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod i18n;
pub mod models;
pub mod poller;
pub mod reconciler;
pub mod render;
pub mod state;
pub mod view;

pub use client::ConsoleClient;
pub use commands::{CommandForm, SubmitOutcome};
pub use config::ConsoleConfig;
pub use error::{ConsoleError, Result};
pub use i18n::{BundleSet, ResourceBundle};
pub use poller::Console;
pub use reconciler::{diff, DetailOutcome, Transition};
pub use state::{ConsoleState, NodeEntry, NodeRegistry, Pane, TabStatus};
pub use view::{ConsoleView, TerminalView};
