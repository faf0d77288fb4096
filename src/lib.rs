#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! Renders one animated cube field into up to eight OS windows at once.
//!
//! Each window is a *view*: a slot in a fixed-size [`views::ViewTable`]
//! that pairs the window with the swap chain bound to it. The primary view
//! owns the GPU device and the HUD; secondary views come and go at runtime
//! and the table keeps their swap chains in step with what the OS reports.

pub mod app;
pub mod errors;
pub mod renderer;
pub mod settings;
pub mod utils;
pub mod views;

pub use app::App;
pub use errors::{MultiwinError, Result};
pub use renderer::Renderer;
pub use settings::Settings;
pub use views::{ViewId, ViewTable, MAX_WINDOWS};
