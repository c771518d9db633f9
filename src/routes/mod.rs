/// Router Module Index
///
/// Routes are split by access level. Protection is applied to the whole
/// authenticated module by a route layer in `create_router`, so no protected
/// endpoint can be registered without the guard.

/// Anonymous access: health, account entry points and article reads.
pub mod public;

/// Everything behind the bearer-token guard.
pub mod authenticated;
