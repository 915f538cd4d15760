// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod errors;
pub mod params;
mod responses;

pub const CRATE_NAME: &str = "equa-bench-api";

pub use errors::{ApiError, ApiErrorCode};
pub use responses::{FinalizeAccepted, FinalizeRejected};
