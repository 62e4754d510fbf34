pub mod errors;
pub mod handlers;
pub mod render;
pub mod routes;
pub mod templates;

pub use errors::GateError;
pub use render::PageRenderer;
pub use routes::create_router;
