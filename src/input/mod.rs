//! Input module - pointer gestures on the board surface
//!
//! Taps are routed straight to the board controller by square. This module
//! only covers gestures that span a pointer-down/pointer-up pair.
//!
//! - `pointer` - swipe-to-undo recognition ([`SwipeDetector`])

pub mod pointer;

// Re-export commonly used items
pub use pointer::*;
