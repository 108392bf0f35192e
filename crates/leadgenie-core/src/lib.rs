#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;

pub mod otp;
pub mod types;

pub use error::{BoxedError, Error, ErrorKind, GENERIC_ERROR_MESSAGE, Result};
pub use otp::{OTP_LENGTH, OtpCode, OtpInput};
