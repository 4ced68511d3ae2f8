// src/lib.rs
pub mod analysis;
pub mod config;
pub mod controller;
pub mod data;
pub mod drawing;
pub mod effects;
pub mod expression;
pub mod gesture;
pub mod landmarks;
pub mod replay;
pub mod shapes;

pub use controller::{AppMode, AppState, Controller, FrameOutput};
pub use landmarks::{FrameError, LandmarkFrame};
