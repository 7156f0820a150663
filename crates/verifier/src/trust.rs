//! Trust discipline
//!
//! Pure rules shared by the body verifier (intra-module) and the
//! linker (inter-module). Fail-closed: anything not explicitly allowed
//! is a violation.

use module::TrustTag;

/// Whether a function with the given trust tag may declassify secrets.
pub fn declassify_allowed(caller: TrustTag) -> bool {
    caller == TrustTag::Trusted
}

/// Whether a function with `caller` trust may call one with `callee`
/// trust. Only the untrusted-to-trusted direction is forbidden.
pub fn call_allowed(caller: TrustTag, callee: TrustTag) -> bool {
    !(caller == TrustTag::Untrusted && callee == TrustTag::Trusted)
}

/// Whether a host-supplied callback may claim the given trust tag.
///
/// Trust is only established by code that passed verification; an
/// opaque host callback cannot be checked, so its ceiling is untrusted.
pub fn host_may_claim(trust: TrustTag) -> bool {
    trust == TrustTag::Untrusted
}
