//! Diagram/Report Renderer
//!
//! Turns analysis results into Mermaid diagram markup or plain structured
//! text. Node identifiers and human-readable labels have different safety
//! requirements and go through separate sanitizers.

pub mod sanitize;
pub mod mermaid;
pub mod text;
