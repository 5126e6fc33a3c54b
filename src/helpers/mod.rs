//! Helper functions for page markup
//!
//! URL generation and small HTML builders shared by the renderer, the
//! listing views and the server's page shell.

mod html;
mod url;

pub use html::*;
pub use url::*;
