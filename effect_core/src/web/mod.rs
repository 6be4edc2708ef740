// Browser glue: DOM helpers, the WebGL2 render surface and the mounted page state.

mod app;
mod dom;
mod surface;

pub use app::{mount, App};
pub use dom::{reveal_all, NO_WEBGL_CLASS};
