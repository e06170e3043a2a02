//! Cache generations and their storage
//!
//! Every build of an app gets its own cache generation, named
//! `pufferfishes-app-<app-id>-v<version>`. Generations are never patched
//! in place; a new build installs a new generation and activation deletes
//! the older ones of the same app.
//!
//! # Generation States
//!
//! | State | Store | Description |
//! |-------|-------|-------------|
//! | Installing | being seeded | Seed paths fetched in parallel, all-or-nothing |
//! | Waiting | complete | Installed, not yet serving requests |
//! | Active | complete, growing | Serves fetches, grows by write-back |
//! | Stale | any | Older generation of the same app, deleted on activate |

pub mod disk;
pub mod generation;
pub mod memory;
pub mod store;

pub use disk::DiskStorage;
pub use generation::{AppId, Generation, VersionToken, NAMESPACE};
pub use memory::MemoryStorage;
pub use store::CacheStorage;
