//! Driftway driving simulation library
//!
//! Exposes the simulation core (physics world, vehicle control, jump arc,
//! endless ground, obstacles, camera and frame loop) for the CLI and tests.

pub mod config;
pub mod game;
