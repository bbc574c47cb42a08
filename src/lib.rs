//! DIY Troubleshooter - Conversational troubleshooting assistant
//!
//! Guides a homeowner through diagnostic decision trees ("workflows"):
//! a free-form problem description selects a workflow, and each reply
//! advances the dialogue until it is resolved or escalated.

pub mod adapters;
pub mod application;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod ports;
