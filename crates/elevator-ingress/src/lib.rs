//! Thin HTTP ingress for the elevator control plane.
//!
//! Validation, authentication, and HTML rendering are external collaborators
//! out of scope here, but this binary is shipped so the workspace is
//! runnable end-to-end: it only
//! validates shapes, appends to the requests stream, and reads snapshots
//! back from the state store. It carries no scheduling or control logic —
//! that all lives in `elevator-scheduler` and `elevator-controller`.

pub mod app;
pub mod config;
