//! View generation check: every key property of a mapped entity set's type
//! must be covered by some scalar mapping, or the update/query views cannot
//! be generated for it.

use crate::artifact::Artifact;
use crate::model::ModelSpace;

use super::compile::{RawError, RuntimeEntityType, RuntimeSetMapping};
use super::error_codes as codes;
use super::error_info::Severity;

pub fn generate_views(
    artifact: &Artifact,
    set_mappings: &[RuntimeSetMapping],
    entity_types: &[RuntimeEntityType],
) -> Vec<RawError> {
    let mut errors = Vec::new();
    for mapping in set_mappings {
        let Some(entity_type) = entity_types
            .iter()
            .find(|ty| ty.name.eq_ignore_ascii_case(&mapping.entity_type))
        else {
            continue;
        };
        for key_property in &entity_type.key {
            let covered = mapping
                .mapped_properties
                .iter()
                .any(|(property, _column)| property.eq_ignore_ascii_case(key_property));
            if !covered {
                errors.push(RawError {
                    code: codes::VIEWGEN_KEY_NOT_MAPPED,
                    severity: Severity::Error,
                    message: format!(
                        "Key property '{}' of '{}' is not mapped; views cannot be generated for EntitySet '{}'",
                        key_property, entity_type.name, mapping.entity_set
                    ),
                    space: ModelSpace::Mapping,
                    position: artifact
                        .tree()
                        .get(mapping.source)
                        .map(|el| el.span.start),
                });
            }
        }
    }
    errors
}
