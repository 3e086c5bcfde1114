// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Entity Identifiers
//!
//! Every entity in the domain is identified by a small newtype wrapping a
//! plain `i64`. Unlike ULID-style identifiers, a database-assigned integer
//! gives a total order that matches insertion order exactly, which is what
//! the "lowest-id wins" duplicate tie-break rule (see
//! [`crate::aggregates::job_aggregate`] and the file repository's
//! `find_winner`) depends on.
//!
//! Each wrapper implements `Display`, `FromStr`, and `Serialize`/
//! `Deserialize`, matching the conventions the teacher established for its
//! own ID value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

macro_rules! id_newtype {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw database-assigned id.
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// The underlying `i64`, e.g. for binding into a `sqlx` query.
            pub const fn get(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

id_newtype!(JobId, "Identifier for a [`crate::entities::job::ProcessingJob`].");
id_newtype!(ZipId, "Identifier for a [`crate::entities::zip::ZipMaster`].");
id_newtype!(FileId, "Identifier for a [`crate::entities::file::FileMaster`].");
id_newtype!(GxId, "Identifier for a [`crate::entities::gx::GxMaster`].");
id_newtype!(GxBucketId, "Tenant/group bucket identifier, also the file-queue FIFO group id.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_round_trips_through_parse() {
        let id = JobId::new(42);
        let parsed: JobId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn ordering_matches_insertion_order() {
        let a = FileId::new(100);
        let b = FileId::new(101);
        assert!(a < b);
    }

    #[test]
    fn serde_is_transparent() {
        let id = GxBucketId::new(7);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "7");
        let back: GxBucketId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
