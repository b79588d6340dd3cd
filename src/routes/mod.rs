/// Router Module Index
///
/// Splits the route table by access level. Authentication is applied to a whole
/// module as a route layer, so a protected endpoint cannot be exposed by accident.

/// Routes reachable without a token: health, registration, login.
pub mod public;

/// Routes guarded by the `AuthUser` middleware: the article and category resources.
pub mod authenticated;
