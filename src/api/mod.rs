// HTTP invocation surface for local development

pub mod invoke;

pub use invoke::{create_invoke_router, InvokeAppState, InvokeRequest, InvokeResponse};
