//! Core intermediate representation and type system for XTP schema documents

pub mod error;
pub mod ir;
pub mod keywords;
pub mod naming;
pub mod types;

pub use error::{CoreError, Diagnostics, ErrorCategory, Location, NormalizeError, ValidationError};
pub use ir::{
    CodeSample, Export, Import, Parameter, Property, Schema, SchemaId, SchemaRef, TypedNode,
    Version, XtpSchema,
};
pub use keywords::Language;
pub use types::{MimeType, TypeShape, XtpFormat, XtpNormalizedKind, XtpNormalizedType, XtpType};
