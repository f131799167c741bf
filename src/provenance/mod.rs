// provenance/ — Trust-boundary enforcement and predicate construction
//
// policy.rs    — flag/env allow-list tables (read-only, injected)
// validate.rs  — untrusted parameter validation -> ValidatedCommand
// command.rs   — build tool argv/env synthesis, registry, exec handoff
// wire.rs      — base64(JSON list) interchange encoding
// context.rs   — trusted CI execution context, secret-stripped
// identity.rs  — OIDC token exchange -> builder identity claim
// predicate.rs — SLSA provenance predicate assembly
// error.rs     — error kinds (all fatal to the invocation)

pub mod command;
pub mod context;
pub mod error;
pub mod identity;
pub mod policy;
pub mod predicate;
pub mod validate;
pub mod wire;
