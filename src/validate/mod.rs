mod compile;
pub mod error_codes;
mod error_info;
mod validator;
mod viewgen;

pub use compile::{
    CompiledRuntimeModel, RawError, RuntimeAssociation, RuntimeAssociationEnd,
    RuntimeAssociationSet, RuntimeContainer, RuntimeEntitySet, RuntimeEntityType, RuntimeProperty,
    RuntimeSetMapping, SchemaParts, compile_mapping, compile_schema,
};
pub use error_info::{ErrorClass, ErrorInfo, ErrorSet, Severity};
pub use validator::{Validator, is_open_in_editor_error};
pub use viewgen::generate_views;
