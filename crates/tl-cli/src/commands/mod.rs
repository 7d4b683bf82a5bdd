// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! CLI command implementations.

pub mod inspect;
pub mod pipeline;
pub mod run;
