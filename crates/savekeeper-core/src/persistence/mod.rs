//! Persistence layer for player profiles.
//!
//! # Overview
//!
//! - **Types** - `ProgressData`, `ProgressMetric`, and the derived `Score`
//! - **Store** - Profile name to file mapping, enumeration, verified writes
//! - **Cipher** - Optional obfuscation of stored text
//! - **Codec** - JSON plus cipher, with corrupt-file reporting
//!
//! # File Locations
//!
//! ```text
//! <data_dir>/
//! ├── <profile>_save.dat     # One file per profile, whole-profile rewrite
//! └── ...
//! ```
//!
//! # Failure Handling
//!
//! The `try_*` functions return typed errors. Their plain counterparts report
//! the failure to the configured `LogSink` and fall back to "absent" or
//! `false`, which is what the managers build on.

pub mod cipher;
pub mod codec;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used items for convenience
pub use cipher::{AesTextCipher, CipherAdapter, CipherError, TextCipher, PASS_PHRASE};
pub use codec::{CodecError, ProfileCodec};
pub use store::{
    FsBackend, MemoryBackend, ProfileStore, StorageBackend, StoreError, WriteReport, SAVE_SUFFIX,
};
pub use types::*;
