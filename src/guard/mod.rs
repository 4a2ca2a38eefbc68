//! Playlist protection subsystem.
//!
//! # Data Flow
//! ```text
//! tick → latest token? ──no──▶ NoToken
//!            │yes
//!            ▼
//!        get playlist ──err──▶ FetchFailed
//!            │
//!      name == desired ──────▶ InSync
//!            │no
//!            ▼
//!      update playlist ──err──▶ CorrectionFailed
//!            │
//!            ▼
//!        Corrected
//! ```

pub mod poller;

pub use poller::{CycleOutcome, PlaylistGuard};
