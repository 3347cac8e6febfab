// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Veridex Maintainers
//
// Unified error types for Veridex.

use thiserror::Error;

/// Top-level error type for all Veridex operations.
#[derive(Debug, Error)]
pub enum VeridexError {
    // -- Input errors --
    #[error("invalid input: {0}")]
    InvalidInput(String),

    // -- Run lifecycle --
    #[error("verification run cancelled")]
    Cancelled,

    // -- Audit / persistence --
    #[error("database error: {0}")]
    Database(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, VeridexError>;
