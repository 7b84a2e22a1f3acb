//! Room-state time engine for the SurgiTrack operating-room dashboard.
//!
//! The engine owns every room's lifecycle: it starts queued operations when
//! their window opens, ends them, runs the disinfection window, and frees
//! the room again. State is derived from stored timestamps and the current
//! instant, so a late or missed tick never loses a transition; the next
//! evaluation replays everything that should have happened.
//!
//! # Modules
//!
//! - [`clock`] -- [`Clock`] trait with system and manual implementations.
//! - [`config`] -- Configuration loading from `surgitrack-config.yaml`.
//! - [`display`] -- Local-time formatting for the dashboard.
//! - [`engine`] -- [`TimeEngine`]: tick and imperative operations.
//! - [`error`] -- [`EngineError`] returned by imperative operations.
//! - [`evaluator`] -- The per-room state-machine evaluator.
//! - [`fleet`] -- Static room definitions and profile validation.
//! - [`runner`] -- Periodic tick loop and shared engine handle.
//! - [`schedule`] -- Ordered per-room operation queue.
//! - [`store`] -- In-memory rooms backed by a durable snapshot slot.
//! - [`views`] -- Cockpit, calendar, statistics and advisory read models.
//!
//! [`Clock`]: clock::Clock
//! [`TimeEngine`]: engine::TimeEngine
//! [`EngineError`]: error::EngineError

pub mod clock;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod fleet;
pub mod runner;
pub mod schedule;
pub mod store;
pub mod views;
