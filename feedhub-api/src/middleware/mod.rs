/// Middleware modules for the API server
///
/// Bearer authentication lives in `app::jwt_auth_layer`; this module holds
/// the response-side layers.

pub mod security;
