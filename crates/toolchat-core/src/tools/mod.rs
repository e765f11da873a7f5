//! Tool catalog management
//!
//! ```text
//! ┌──────────────────────┐   tools/list    ┌──────────────────────┐
//! │  ProviderSession     │ ──────────────▶ │  Provider process    │
//! │  (cached registry)   │ ◀────────────── │  (MCP over stdio)    │
//! └──────────────────────┘   tools/call    └──────────────────────┘
//!           │
//!           ▼
//! ┌──────────────────────┐
//! │  ToolRegistry        │  name lookup, provider order
//! └──────────────────────┘
//! ```

mod prompt;
mod registry;

pub use prompt::render_tool_prompt;
pub use registry::{RegistryError, ToolRegistry};
