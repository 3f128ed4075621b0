//! Form composer for the Nectar attribute engine
//!
//! Assembles the field set for a form purpose (edit, search, filter, sort)
//! by merging the caller's static fields with the cataloged attributes
//! applicable to the current category scope. Static fields always win;
//! generated fields never overwrite a declared name.

pub mod composer;

pub use composer::{ComposeRequest, FormComposer, FormPurpose, MODERATION_STATUS};
