//! Clients for the opaque external collaborators: text generation,
//! document rendering, and blob storage.

pub mod genai;
pub mod renderer;
pub mod storage;

pub use genai::TextGenerator;
pub use renderer::{RenderMetadata, RendererClient};
pub use storage::ReportStore;
