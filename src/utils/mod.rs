//! Deterministic image transform stages surrounding inference

pub mod orientation;
pub mod postprocessing;
pub mod preprocessing;
