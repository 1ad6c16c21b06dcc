//! Non-destructive edit-chain coordinator for a remote photo editor.
//!
//! Edits accumulate as an ordered chain of operations that the server
//! applies left-to-right to the original source image. Slider adjustments
//! merge into the chain (at most one entry per kind), discrete operations
//! append, and preview traffic is debounced and epoch-stamped so a slow
//! early response can never clobber a newer preview.
//!
//! # Examples
//!
//! Pure chain manipulation with [`core::chain::EditChain`]:
//! ```
//! use editchain::{
//!     core::{adjust::Adjustments, chain::EditChain},
//!     op::EditOp,
//!     types::AdjustKind,
//! };
//!
//! let mut chain = EditChain::new();
//! let mut sliders = Adjustments::new();
//!
//! chain.append(EditOp::Rotate { degrees: 90 }).expect("append");
//! sliders.set(AdjustKind::Brightness, 30);
//! sliders.set(AdjustKind::Contrast, -20);
//! let snapshot = sliders.reconcile(&mut chain);
//!
//! assert_eq!(snapshot.len(), 3);
//! assert_eq!(snapshot[0], EditOp::Rotate { degrees: 90 });
//!
//! // Back to neutral removes the entry entirely.
//! sliders.set(AdjustKind::Brightness, 0);
//! let snapshot = sliders.reconcile(&mut chain);
//! assert_eq!(
//!     &snapshot[..],
//!     &[
//!         EditOp::Rotate { degrees: 90 },
//!         EditOp::Adjust { kind: AdjustKind::Contrast, value: -20 },
//!     ],
//! );
//! ```
//!
//! Coordinator usage against the HTTP backend:
//! ```no_run
//! use std::sync::Arc;
//!
//! use editchain::{
//!     remote::http::HttpBackend,
//!     runtime::handle::{spawn_editor, EditorConfig},
//!     types::AdjustKind,
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let backend = Arc::new(HttpBackend::new("http://192.168.0.10:8000").with_token("..."));
//! let editor = spawn_editor(7, backend, EditorConfig::default());
//!
//! editor.rotate(90).await.expect("rotate");
//! editor
//!     .set_adjustment(AdjustKind::Brightness, 30)
//!     .await
//!     .expect("adjust");
//! editor.save().await.expect("save");
//! editor.shutdown().await.expect("shutdown");
//! # }
//! ```

/// Edit chain and slider reconciliation.
pub mod core;
/// Image metadata and artifact references.
pub mod image;
/// Edit operation model and wire tokens.
pub mod op;
/// Remote image-service trait, wire bodies, and HTTP transport.
pub mod remote;
/// Single-writer coordinator, scheduler, and events.
pub mod runtime;
/// Per-image editing session state machine.
pub mod session;
/// Shared primitive types and enums.
pub mod types;
