// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Room-scoped authorization carried in the credential `payload`.
//!
//! An empty payload grants whatever the platform allows by default. To pin a
//! credential to one room, render a [`RoomPayload`]:
//!
//! ```text
//! {"room_id":"study-hall","privilege":{"1":1,"2":0},"stream_id_list":null}
//! ```
//!
//! Privilege key `"1"` is "may log into the room", `"2"` is "may publish a
//! stream". Values are `1` (allow) or `0` (deny).

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const PRIVILEGE_LOGIN_ROOM: &str = "1";
const PRIVILEGE_PUBLISH_STREAM: &str = "2";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomPrivilege {
	pub login_room: bool,
	pub publish_stream: bool,
}

impl Default for RoomPrivilege {
	fn default() -> Self {
		Self {
			login_room: true,
			publish_stream: true,
		}
	}
}

impl Serialize for RoomPrivilege {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut map = serializer.serialize_map(Some(2))?;
		map.serialize_entry(PRIVILEGE_LOGIN_ROOM, &u8::from(self.login_room))?;
		map.serialize_entry(PRIVILEGE_PUBLISH_STREAM, &u8::from(self.publish_stream))?;
		map.end()
	}
}

impl<'de> Deserialize<'de> for RoomPrivilege {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		#[derive(Deserialize)]
		struct Raw {
			#[serde(rename = "1", default)]
			login_room: u8,
			#[serde(rename = "2", default)]
			publish_stream: u8,
		}

		let raw = Raw::deserialize(deserializer)?;
		Ok(Self {
			login_room: raw.login_room != 0,
			publish_stream: raw.publish_stream != 0,
		})
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomPayload {
	pub room_id: String,
	pub privilege: RoomPrivilege,
	pub stream_id_list: Option<Vec<String>>,
}

impl RoomPayload {
	/// Full privileges in `room_id`, any stream.
	pub fn new(room_id: impl Into<String>) -> Self {
		Self {
			room_id: room_id.into(),
			privilege: RoomPrivilege::default(),
			stream_id_list: None,
		}
	}

	/// Join and listen, but never publish.
	pub fn listen_only(mut self) -> Self {
		self.privilege.publish_stream = false;
		self
	}

	pub fn with_streams<I, S>(mut self, streams: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.stream_id_list = Some(streams.into_iter().map(Into::into).collect());
		self
	}

	/// Compact JSON for [`crate::IssueRequest::with_payload`].
	pub fn to_payload_string(&self) -> Result<String, serde_json::Error> {
		serde_json::to_string(self)
	}

	pub fn parse(payload: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(payload)
	}
}
