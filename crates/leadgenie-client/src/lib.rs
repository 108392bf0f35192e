#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod http;
pub mod leads;
pub mod otp;
pub mod provider;
pub mod session;
pub mod storage;

#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;

pub use http::{ApiClient, ApiConfig, ApiRequest, AuthEvent};
pub use leadgenie_core::{Error, ErrorKind, Result};
pub use leads::LeadsClient;
pub use otp::{OtpFlow, OtpSnapshot, OtpStage};
pub use provider::{AuthProvider, AuthService};
pub use session::{NavigationTarget, Navigator, Session, SessionManager, SessionState};
pub use storage::{FileStore, KeyValueStore, MemoryStore, TokenStore};
