//! # reqgate evidence
//!
//! Deterministic, bounded inventory of what a codebase demonstrably contains.
//!
//! ## Architecture
//!
//! ```text
//! SourceTree (FsTree │ MemoryTree)
//!     │  sorted relative paths, filtered by ScanScope
//!     ▼
//! EvidenceScanner ── one pass, path order
//!     ├─> routes      call syntax, controller decorators, api/**/route.ts
//!     ├─> schema      CREATE TABLE / ALTER TABLE ADD COLUMN under migrations/
//!     ├─> tests       *.test.* / *.spec.* / test_*.py / *_test.go
//!     ├─> surfaces    pages, screens, CI workflows
//!     └─> snippets    literal windows around route and test anchors
//!     ▼
//! ScanReport ── capped by ScanLimits, caps that fired listed in `truncated`
//!     ├─> evidence_items()  typed EvidenceItems for citation
//!     └─> render_digest() / render_snippets()
//! ```
//!
//! The scanner never invents findings: a cap that fired means "not looked at", and the
//! digest says so.
//!
//! ## Example
//!
//! ```rust
//! use reqgate_evidence::{EvidenceScanner, MemoryTree};
//!
//! let tree = MemoryTree::new().with_file(
//!     "app/api/rides/[id]/route.ts",
//!     "export async function GET() {}\n",
//! );
//! let report = EvidenceScanner::default().scan(&tree);
//! assert_eq!(report.endpoints[0].signature(), "GET /api/rides/:id");
//! ```

mod digest;
mod error;
mod limits;
mod routes;
mod scanner;
mod schema;
mod scope;
mod snippets;
mod surfaces;
mod test_files;
mod text;
mod tree;

pub use digest::{render_digest, render_snippets};
pub use error::{EvidenceError, Result};
pub use limits::{ScanLimits, DEFAULT_MAX_FILE_BYTES};
pub use routes::{derive_api_path, scan_routes, Endpoint, RouteSource};
pub use scanner::{EvidenceScanner, ScanReport};
pub use schema::{normalize_ident, ColumnDef, SchemaCatalog, TableDef};
pub use scope::ScanScope;
pub use snippets::Snippet;
pub use surfaces::CiWorkflow;
pub use test_files::{TestCase, TestFile, TestFramework};
pub use tree::{FsTree, MemoryTree, SourceTree, DEFAULT_SKIP_DIRS};
