//! Profile module
//!
//! User profiles as stored in the `profiles` collection.

mod model;

pub use model::Profile;
