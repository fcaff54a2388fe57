// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Token layouts.
//!
//! Two layouts ship under the same `"04"` version tag:
//!
//! ```text
//! split: base64(body) "." base64(signature)
//! blob:  base64(body "." hex(signature))
//! ```
//!
//! Both use the standard base64 alphabet with padding. The blob signature is
//! lower-case hex only, so each credential has exactly one spelling. The same inputs
//! produce different strings and a verifier for one rejects the other, so
//! the layout is always configured explicitly and decoding never falls back
//! to the other variant.

use std::fmt;
use std::str::FromStr;

use base64::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::signer::{Signature, SIGNATURE_LEN};

/// Which token layout to produce and accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenVariant {
	/// Variant A: body and raw signature base64-encoded separately, joined by `.`.
	Split,
	/// Variant B: body, `.`, hex signature, base64-encoded as one blob.
	Blob,
}

impl TokenVariant {
	pub fn all() -> &'static [TokenVariant] {
		&[TokenVariant::Split, TokenVariant::Blob]
	}
}

impl fmt::Display for TokenVariant {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TokenVariant::Split => write!(f, "split"),
			TokenVariant::Blob => write!(f, "blob"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown token variant {0:?}: expected \"split\" or \"blob\"")]
pub struct UnknownVariantError(pub String);

impl FromStr for TokenVariant {
	type Err = UnknownVariantError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"split" | "a" => Ok(TokenVariant::Split),
			"blob" | "b" => Ok(TokenVariant::Blob),
			_ => Err(UnknownVariantError(s.to_string())),
		}
	}
}

/// The two halves of a token before any check has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedToken {
	pub body: Vec<u8>,
	pub signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
	/// The body part could not be recovered; the token is not of this variant.
	#[error("{0}")]
	Malformed(String),

	/// The body was found but the signature part does not decode.
	#[error("signature part does not decode: {0}")]
	Signature(String),
}

pub fn encode(variant: TokenVariant, body: &[u8], signature: &Signature) -> String {
	match variant {
		TokenVariant::Split => {
			let mut token = BASE64_STANDARD.encode(body);
			token.push('.');
			token.push_str(&BASE64_STANDARD.encode(signature.as_bytes()));
			token
		}
		TokenVariant::Blob => {
			let mut blob = Vec::with_capacity(body.len() + 1 + SIGNATURE_LEN * 2);
			blob.extend_from_slice(body);
			blob.push(b'.');
			blob.extend_from_slice(signature.to_hex().as_bytes());
			BASE64_STANDARD.encode(blob)
		}
	}
}

pub fn decode(variant: TokenVariant, token: &str) -> Result<DecodedToken, DecodeError> {
	if token.is_empty() {
		return Err(DecodeError::Malformed("token is empty".to_string()));
	}

	match variant {
		TokenVariant::Split => decode_split(token),
		TokenVariant::Blob => decode_blob(token),
	}
}

fn decode_split(token: &str) -> Result<DecodedToken, DecodeError> {
	let mut parts = token.split('.');
	let (Some(body), Some(signature), None) = (parts.next(), parts.next(), parts.next()) else {
		return Err(DecodeError::Malformed(
			"split token must contain exactly one '.'".to_string(),
		));
	};

	let body = BASE64_STANDARD
		.decode(body)
		.map_err(|e| DecodeError::Malformed(format!("body is not base64: {e}")))?;
	let signature = BASE64_STANDARD
		.decode(signature)
		.map_err(|e| DecodeError::Signature(e.to_string()))?;

	Ok(DecodedToken { body, signature })
}

fn decode_blob(token: &str) -> Result<DecodedToken, DecodeError> {
	let blob = BASE64_STANDARD
		.decode(token)
		.map_err(|e| DecodeError::Malformed(format!("token is not base64: {e}")))?;

	let Some(dot) = blob.iter().rposition(|&b| b == b'.') else {
		return Err(DecodeError::Malformed(
			"blob token has no '.' separator".to_string(),
		));
	};

	let signature_hex = &blob[dot + 1..];
	if signature_hex.len() != SIGNATURE_LEN * 2 {
		return Err(DecodeError::Signature(format!(
			"expected {} hex characters, found {}",
			SIGNATURE_LEN * 2,
			signature_hex.len()
		)));
	}
	if let Some(position) = signature_hex
		.iter()
		.position(|&b| !matches!(b, b'0'..=b'9' | b'a'..=b'f'))
	{
		return Err(DecodeError::Signature(format!(
			"non lower-case hex character at position {position}"
		)));
	}
	let signature = hex::decode(signature_hex).map_err(|e| DecodeError::Signature(e.to_string()))?;

	Ok(DecodedToken {
		body: blob[..dot].to_vec(),
		signature,
	})
}
