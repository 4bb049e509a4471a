/*!
 * Security Module
 * Caller impersonation for branch syscalls
 */

pub mod credentials;

pub use credentials::CredentialScope;
