//! Stable error taxonomy. Policy code matches on these variants
//! directly instead of string-sniffing an `anyhow::Error`; task-level and
//! startup code still uses `anyhow` for everything else.

use std::fmt;

/// Why a decoder could not produce typed state from raw account bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// Leading discriminator / data length does not match this decoder.
    NotThisKind,
    /// Discriminator matched but the payload is truncated or inconsistent.
    Malformed,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::NotThisKind => write!(f, "not this kind"),
            DecodeError::Malformed => write!(f, "malformed payload"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Why `registry::commit` refused to apply an update. `Applied` is not an
/// error; it is the success case returned alongside `updated: true`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitRejection {
    /// `(slot, write_version)` was not strictly newer than the stored tuple.
    Stale,
    /// Key is not a member of the pool's frozen topology.
    OutOfTopology,
    /// An RPC-sourced write targeted a pool whose topology is already frozen.
    RpcForbidden,
}

impl fmt::Display for CommitRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitRejection::Stale => write!(f, "stale (slot, write_version)"),
            CommitRejection::OutOfTopology => write!(f, "key outside frozen topology"),
            CommitRejection::RpcForbidden => write!(f, "rpc write forbidden on frozen pool"),
        }
    }
}

impl std::error::Error for CommitRejection {}

/// ALT resolution failure surfaced to a pending-tx decode caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AltError {
    /// One or more referenced ALT addresses are not in the cache.
    Miss(Vec<crate::types::Address>),
    /// The upstream fetch for a previously-missed ALT failed.
    FetchFailed(String),
}

impl fmt::Display for AltError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AltError::Miss(addrs) => write!(f, "alt miss: {} address(es)", addrs.len()),
            AltError::FetchFailed(reason) => write!(f, "alt fetch failed: {reason}"),
        }
    }
}

impl std::error::Error for AltError {}

/// Bootstrap / refresh RPC dependency-fetch failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchError {
    Timeout,
    Rpc(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Timeout => write!(f, "rpc fetch timeout"),
            FetchError::Rpc(reason) => write!(f, "rpc error: {reason}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Why the bundle builder could not assemble a transaction for an
/// opportunity it was handed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BundleBuildError {
    MissingDependency(&'static str),
    UnquotableVenue(&'static str),
}

impl fmt::Display for BundleBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BundleBuildError::MissingDependency(what) => write!(f, "missing dependency: {what}"),
            BundleBuildError::UnquotableVenue(why) => write!(f, "venue cannot be quoted: {why}"),
        }
    }
}

impl std::error::Error for BundleBuildError {}
