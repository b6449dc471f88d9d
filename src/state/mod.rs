//! Form state module

mod form_state;
mod reducer;

pub use form_state::*;
pub use reducer::*;
