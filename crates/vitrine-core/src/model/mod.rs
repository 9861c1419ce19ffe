//! Category records as the backend stores them.

pub mod category;
