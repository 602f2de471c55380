//! The identity contract the engine consumes: "the current request
//! identifies a team, possibly anonymous" (spec.md §1 Non-goals).
//!
//! The login handshake itself (`POST /auth.php` verifying a team's bearer
//! token and minting a session cookie) and the per-request lookup are in
//! scope; the generic redirect-on-missing-auth *middleware* transport
//! plumbing is not — each handler in `ctf-server` decides what to do with
//! [`MaybeTeam`]/[`AuthedTeam`] itself, leaving response shaping to the
//! handler rather than a `Transform` layer.
mod extractor;
mod session;

pub use extractor::AuthedTeam;
pub use extractor::MaybeTeam;
pub use extractor::Unauthenticated;
pub use session::issue_session;
pub use session::SESSION_COOKIE;
