//! # gesture_morph
//!
//! Hand-gesture controller for a morphing particle field: a cloud of
//! particles flows between procedural 3D shapes and point clouds sampled
//! from photos.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Hand | Action |
//! |---|---|---|
//! | Open palm | Left | Enter photo view (first photo); autoplay on |
//! | Fist | Left | Back to the procedural shape |
//! | Swipe left / right | Right | Previous / next photo (photo view) |
//! | Index leaning left / right | Right | Previous / next photo (photo view) |
//! | Fist | Right | Lock the current view; autoplay off |
//! | Point, held > 1.2 s | Right | Select (once per hold); lock |
//! | Anything else / no hand | Right | Release the lock; autoplay on |
//!
//! Left-hand mode switches take priority over everything the right hand does
//! in the same frame.  While in photo view and unlocked, autoplay moves to the
//! next photo after 5 s without a switch.
//!
//! ## Feature flags
//!
//! * (default) **Simulation mode**. Keyboard keys pose synthetic hands.
//! * `leap` **Hardware mode**. Landmarks from a LeapMotion controller via LeapC.
//!
//! ### Keyboard
//!
//! | Key | Effect |
//! |---|---|
//! | `O` / `F` (hold) | Left open palm / fist |
//! | `G` / `P` (hold) | Right fist / pointing |
//! | `N` / `B` (hold) | Right index leaning next / previous |
//! | `←` / `→` | Right-hand swipe |
//! | `1`–`4` | Heart, sphere, torus, spiral |
//! | `C` | Next color |
//! | `+` / `-` | Particle size |
//! | `Q` / `Escape` | Quit |

pub mod clock;
pub mod navigation;
pub mod autoplay;
pub mod source;
pub mod visualizer;
pub mod app;
