//! Core domain models for registry quality computation.
//!
//! This module defines the data structures shared by the timeline reconciler and
//! the award classifier: encounters, recanalization pathways, site metric rows
//! and award tiers.

pub mod domain;
