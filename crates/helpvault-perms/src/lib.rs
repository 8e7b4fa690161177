//! # Help Vault Permissions
//!
//! Group permission rules and article encryption.
//!
//! ## Overview
//!
//! Access to a special-access group is expressed as independent ADMIN and
//! VIEW grants. This crate holds the pure rules over those grants and the
//! symmetric encryption applied to group articles. Storage of the grants
//! lives in `helpvault-store`.
//!
//! ## Encryption Model
//!
//! One content key ([`ContentKey`], ChaCha20-Poly1305) is injected at
//! startup and encrypts every article. Each write uses its own 96-bit IV,
//! chosen by an [`IvStrategy`]. The IV and ciphertext are stored together
//! as [`SealedContent`].
//!
//! ## Usage
//!
//! ```rust
//! use helpvault_perms::{ContentKey, IvStrategy, SealedContent};
//!
//! let key = ContentKey::generate();
//! let sealed = SealedContent::seal(&key, b"notes", IvStrategy::Random).unwrap();
//! let stored = sealed.encode();
//!
//! let opened = SealedContent::decode(&stored).unwrap().open(&key).unwrap();
//! assert_eq!(opened, b"notes");
//! ```

pub mod crypto;
pub mod envelope;
pub mod error;
pub mod grant;
pub mod state;

pub use crypto::{
    ciphertext_len, ContentIv, ContentKey, IvStrategy, SymmetricCipher, IV_LEN, TAG_LEN,
};
pub use envelope::{SealedContent, PAIR_DELIMITER};
pub use error::{PermsError, Result};
pub use grant::{bootstrap_grants, instructor_grants, GroupOperation};
pub use state::GroupRoster;
