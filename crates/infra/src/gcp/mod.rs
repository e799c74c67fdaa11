//! Google Cloud collaborators used by the managed-cluster source.
//!
//! Both collaborators sit behind traits (`SecretAccessor`, `ClusterDialer`) so
//! the source can be exercised without network access. The concrete clients
//! talk to the public REST endpoints with a token from the metadata server.

pub mod dialer;
pub mod secrets;
pub mod token;

pub use dialer::{AlloyDbDialer, ClusterDialer, DialError, DialTarget, InstanceUri};
pub use secrets::{SecretAccessor, SecretError, SecretManagerClient, SecretPayload, SecretVersionName};
pub use token::{GcpClientConfig, MetadataTokenSource};
