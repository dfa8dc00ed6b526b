/// Router Module Index
///
/// Organizes the application's routing into access-segregated modules. The
/// split is the whole point of this lab: the same domain is mounted twice,
/// once with every control in place and once with none, so the two trees
/// can be read side by side.

/// Routes accessible to all clients: liveness, lab metadata, documentation.
pub mod public;

/// The hardened surface. Authentication middleware plus explicit policy
/// guards in front of every handler.
pub mod secure;

/// The broken surface. No authentication, no authorization, entity-level
/// input and output. Deliberately wrong.
pub mod vulnerable;
