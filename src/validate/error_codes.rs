//! Validation error codes.
//!
//! 1xxx CSDL, 2xxx SSDL, 3xxx MSL, 4xxx view generation, 5xxx designer
//! structural checks. A fixed subset is rewritten into designer-friendly
//! messages by the validator; everything else passes through verbatim.

// CSDL (conceptual model)
pub const CSDL_MODEL_MISSING: u32 = 1000;
pub const CSDL_UNRESOLVED_REFERENCE: u32 = 1001;
pub const CSDL_ENTITY_TYPE_WITHOUT_KEY: u32 = 1002;
pub const CSDL_UNQUALIFIED_COMPLEX_TYPE: u32 = 1005;
pub const CSDL_DOCUMENT_INVALID: u32 = 1900;

// SSDL (storage model)
pub const SSDL_MODEL_MISSING: u32 = 2000;
pub const SSDL_UNRESOLVED_REFERENCE: u32 = 2001;
pub const SSDL_ENTITY_TYPE_WITHOUT_KEY: u32 = 2002;
pub const SSDL_DOCUMENT_INVALID: u32 = 2900;

// MSL (mapping)
pub const MSL_MODEL_MISSING: u32 = 3000;
pub const MSL_UNRESOLVED_REFERENCE: u32 = 3001;
pub const MSL_INSTANCE_NOT_SPECIFIED: u32 = 3002;
pub const MSL_ASSOCIATION_SET_NOT_FULLY_MAPPED: u32 = 3003;
pub const MSL_FUNCTION_IMPORT_UNSUPPORTED: u32 = 3006;
pub const MSL_FRAGMENT_SCHEMA_INVALID: u32 = 3008;
pub const MSL_DOCUMENT_INVALID: u32 = 3900;

// View generation
pub const VIEWGEN_KEY_NOT_MAPPED: u32 = 4001;

// Designer structural checks
pub const DESIGNER_DUPLICATE_SYMBOL: u32 = 5001;

/// Codes indicating the document is too malformed to keep showing the
/// in-memory model as editable; these force open-document-at-location
/// behavior instead of silent toleration.
pub const UNRECOVERABLE: &[u32] = &[
    CSDL_DOCUMENT_INVALID,
    SSDL_DOCUMENT_INVALID,
    MSL_DOCUMENT_INVALID,
];

/// Secondary/derived codes suppressed from open-in-editor navigation: they
/// restate a problem another error already points at.
pub const SUPPRESSED_IN_EDITOR: &[u32] = &[MSL_FRAGMENT_SCHEMA_INVALID, VIEWGEN_KEY_NOT_MAPPED];

pub fn is_unrecoverable(code: u32) -> bool {
    UNRECOVERABLE.contains(&code)
}
