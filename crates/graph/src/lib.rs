//! # Codesum Graph
//!
//! Heuristic dependency discovery for code chunks.
//!
//! ## Architecture
//!
//! ```text
//! Project files
//!     │
//!     ├──> Project Index (built once, read-only afterwards)
//!     │      ├─ File text, read once
//!     │      ├─ Declared methods per file
//!     │      └─ Declared types per file (with declaration line)
//!     │
//!     └──> Dependency Resolver
//!            ├─ Find `receiver.method(` call sites in a chunk
//!            ├─ Resolve: same file -> import -> same package
//!            └─ Extract the source text of a resolved method
//! ```
//!
//! Resolution is best-effort: calls that match nothing are dropped, and a
//! missing or unreadable file never fails a lookup.

mod error;
mod index;
mod resolver;
mod types;

pub use error::{GraphError, Result};
pub use index::ProjectIndex;
pub use resolver::DependencyResolver;
pub use types::{Dependency, DependencyScan, FileEntry};
