/*!
 * Pool integration tests entry point
 */

#[path = "pool/common.rs"]
mod common;

#[path = "pool/policy_test.rs"]
mod policy_test;

#[path = "pool/readdir_test.rs"]
mod readdir_test;

#[path = "pool/clonepath_test.rs"]
mod clonepath_test;

#[path = "pool/link_exdev_test.rs"]
mod link_exdev_test;

#[path = "pool/broadcast_test.rs"]
mod broadcast_test;

#[path = "pool/reload_test.rs"]
mod reload_test;
