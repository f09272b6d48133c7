//! Hybrid question-answering pipeline over the procurement database.
//!
//! Per incoming message the runtime decides, in order:
//! 1. **FAQ fallback** (`faq`) - greetings and domain FAQ answered from a
//!    static table, no database or model involved.
//! 2. **Intent matching** (`intent`, `templates`) - an ordered table of
//!    question templates; the first template whose pattern matches and
//!    whose slots all resolve wins and yields SQL directly.
//! 3. **LLM generation** (`generator`, `llm`) - a schema-aware prompt asks
//!    the model for a single SELECT when no template fits.
//! 4. **Safety validation** (`validator`) - whatever SQL was produced is
//!    checked against the schema whitelist and clamped to a row limit
//!    before it may touch the database.
//! 5. **Execution and composition** (`composer`) - the bounded result set
//!    becomes a Spanish answer, deterministic for template hits and
//!    LLM-narrated otherwise.
//!
//! # Safety Principle
//!
//! The model is strictly a translator. Nothing it emits reaches the
//! database without passing the validator, and the database session is
//! read-only by construction. Every per-request failure degrades to a
//! conversational answer; none escapes `process_message`.

pub mod composer;
pub mod conversation;
pub mod faq;
pub mod generator;
pub mod intent;
pub mod llm;
pub mod normalize;
pub mod runtime;
pub mod templates;
pub mod validator;
