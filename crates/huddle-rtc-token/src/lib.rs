// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Short-lived credentials for joining RTC audio/video rooms.
//!
//! A client never sees the shared server secret. Instead the server issues a
//! token: the credential fields rendered as compact JSON, an HMAC-SHA256 over
//! exactly those bytes, and a base64 wrapping of both. The RTC platform
//! recomputes the HMAC and checks the expiry.
//!
//! ```text
//! raw secret ──normalize──> NormalizedSecret ──> Signer
//!                                                  │
//! IssueRequest ──> CredentialRecord ──canonical──> bytes ──sign──> Signature
//!                                                  │                   │
//!                                                  └──── encode(variant) ┘──> token
//! ```
//!
//! Two token layouts exist under the same `"04"` version tag and they do not
//! interoperate (see [`TokenVariant`]). Issuer and verifier are always
//! configured with one explicitly; nothing here guesses.
//!
//! # Example
//!
//! ```
//! use huddle_rtc_token::{CredentialIssuer, CredentialVerifier, IssueRequest, IssuerConfig, TokenVariant};
//!
//! let secret = "0123456789abcdef0123456789abcdef";
//! let issuer = CredentialIssuer::new(IssuerConfig::new(TokenVariant::Split), Some(secret))?;
//! let issued = issuer.issue(&IssueRequest::new(128222087, "u-42"))?;
//!
//! let verifier = CredentialVerifier::new(TokenVariant::Split, Some(secret))?;
//! let record = verifier.verify(&issued.token, "u-42", issued.record.issued_at())?;
//! assert_eq!(record, issued.record);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod canonical;
pub mod clock;
pub mod encoding;
pub mod error;
pub mod issuer;
pub mod nonce;
pub mod payload;
pub mod record;
pub mod secret;
pub mod signer;
pub mod verifier;

pub use clock::{Clock, FixedClock, SystemClock};
pub use encoding::{DecodeError, DecodedToken, TokenVariant, UnknownVariantError};
pub use error::{ErrorKind, IssueError, VerifyError};
pub use issuer::{
	issue, CredentialIssuer, IssueRequest, IssuedToken, IssuerConfig, TtlPolicy, DEFAULT_TTL_SECS,
	MAX_TTL_SECS,
};
pub use nonce::{FixedNonce, NonceError, NonceSource, OsNonceSource};
pub use payload::{RoomPayload, RoomPrivilege};
pub use record::{ArgumentError, CredentialRecord, PROTOCOL_VERSION};
pub use secret::{
	normalize, NormalizedSecret, SecretCharset, SecretError, SecretPolicy, DEFAULT_SECRET_LEN,
};
pub use signer::{Signature, Signer, SigningError, SIGNATURE_LEN};
pub use verifier::{inspect, verify, CredentialVerifier, InspectedToken};
