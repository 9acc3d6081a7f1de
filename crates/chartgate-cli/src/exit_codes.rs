//! Exit codes for CLI operations
//!
//! These follow sysexits.h where one applies.

/// Unspecified failure
pub const ERROR: i32 = 1;

/// Chart reference is not an `oci://` or `http(s)://*.tgz` URL
pub const INVALID_REFERENCE: i32 = 2;

/// No repository, chart or status object matched
pub const NOT_FOUND: i32 = 3;

/// Kubernetes API unreachable or rejected the request
pub const CLUSTER_ERROR: i32 = 4;

/// File not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Repository credentials could not be read or staged
pub const CREDENTIAL_ERROR: i32 = 6;

/// Configuration file unreadable or invalid (sysexits.h EX_CONFIG)
pub const CONFIG_ERROR: i32 = 78;
