//! App Pipeline
//!
//! Entry point for mounting a root component into a host container.
//!
//! ```text
//! create_app(renderer, root) → App::mount(container) → render effect → host
//! ```
//!
//! After mounting, the application is driven entirely by reactive writes:
//! every write observed by a component's render re-patches that component's
//! subtree. [`MountHandle`] tears the whole tree down again.

pub mod mount;

pub use mount::{create_app, App, MountHandle};
