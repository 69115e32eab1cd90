//! # silt-base
//!
//! Core library for dialect-aware SQL parsing, linting, and auto-fixing.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! linter    → Facade: lex → parse → lint → fix loop
//!   ↓
//! rules     → Rule trait, crawlers, fixes, noqa, bundled rule set
//!   ↓
//! reflow    → Whitespace/indentation layout engine (respace, rebreak, reindent)
//!   ↓
//! parser    → File-level parse driver, unparsable fallback
//!   ↓
//! dialects  → Dialect inheritance, ANSI catalog, derived dialects
//!   ↓
//! grammar   → Matchables, combinators, match results, parse context
//!   ↓
//! lexer     → Matcher set (literal + regex), raw segment production
//!   ↓
//! segments  → Lossless segment tree, meta segments, search helpers
//!   ↓
//! templater → TemplatedFile model, templated↔source slice mapping
//!   ↓
//! base      → Primitives (slices, line index, position markers)
//! ```

// ============================================================================
// MODULES (dependency order: base → templater → … → linter)
// ============================================================================

/// Foundation types: slice helpers, LineIndex, PositionMarker
pub mod base;

/// Templated file model: raw/templated slices, bidirectional mapping
pub mod templater;

/// Segment tree: lossless leaves and branches, meta segments
pub mod segments;

/// Lexer: ordered matcher list, raw segment production
pub mod lexer;

/// Grammar engine: combinators, match results, parse context
pub mod grammar;

/// Dialects: inheritance protocol, ANSI catalog, derivations
pub mod dialects;

/// Parser: drives the file grammar over the lexed stream
pub mod parser;

/// Reflow: whitespace and indentation layout engine
pub mod reflow;

/// Rules: rule trait, crawlers, fixes, noqa, bundled rules
pub mod rules;

/// Linter facade: orchestrates lex → parse → lint → fix
pub mod linter;

/// Typed configuration consumed by the engine and rules
pub mod config;

/// Error and violation kinds
pub mod errors;

// Re-export the high-traffic types.
pub use config::LintConfig;
pub use errors::{CoreError, Severity, Violation};
pub use linter::{LintedFile, Linter};
pub use segments::Segment;
pub use templater::TemplatedFile;
