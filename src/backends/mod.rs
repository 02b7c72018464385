//! Runtime backends.
//!
//! Implementations of [`VrRuntime`](crate::runtime::VrRuntime). The crate
//! ships the scripted in-memory backend used by demos and tests; native
//! backends live with the hosting application, which owns the SDK binding
//! and hands the bridge a boxed runtime.

pub mod scripted;
