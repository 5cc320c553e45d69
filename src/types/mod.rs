// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Strong types for amounts.
//!
//! - Token decimals and exact normalization of raw ERC-20 amounts
//! - Wei amounts for gas costs

pub mod decimals;
pub mod wei;

// Note: Public types are re-exported from lib.rs, not here
