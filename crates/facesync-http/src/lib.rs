//! facesync-http — HTTP implementation of the recognition-service boundary.
//!
//! Talks to a ProjectOxford-style face REST API (person groups, persons,
//! persisted faces, detect, identify, train) over reqwest, mapping HTTP
//! statuses onto the core error taxonomy.

pub mod client;

pub use client::HttpFaceClient;
