pub mod account_helpers;
pub mod auth_helpers;
pub mod identity_helpers;
pub mod media_helpers;
pub mod post_helpers;
pub mod sanitization_helpers;
pub mod token_helpers;
pub mod visibility_helpers;
