// Place catalogue: discover feed, category listings, search, map and detail.
// Reads go through the anonymous data client unless a session is present.

pub mod catalog;
pub mod handlers;
