use tracing::debug;

use crate::artifact::{Artifact, ArtifactEvent};
use crate::model::{ElementId, ElementKind, ModelSpace};

use super::compile::{CompiledRuntimeModel, RawError, SchemaParts, compile_mapping, compile_schema};
use super::error_codes as codes;
use super::error_info::{ErrorClass, ErrorInfo, Severity};
use super::viewgen::generate_views;

/// Compiles the bound model into runtime metadata and maintains the
/// artifact's error set.
///
/// The pipeline runs CSDL, then SSDL, then MSL, then view generation,
/// stopping at the first stage that is missing or carries blocking errors.
/// A stage whose error class is clean keeps its stored errors; only dirty
/// (or forced) classes are recomputed and cleared.
pub struct Validator<'a> {
    artifact: &'a mut Artifact,
}

impl<'a> Validator<'a> {
    pub fn new(artifact: &'a mut Artifact) -> Self {
        Self { artifact }
    }

    /// Validate the document set against the target runtime version.
    ///
    /// Returns the compiled runtime metadata when every attempted stage is
    /// free of `Error`-severity entries, `None` otherwise.
    pub fn validate_artifact_set(
        &mut self,
        force_validation: bool,
        validate_mapping: bool,
        run_view_gen: bool,
    ) -> Option<CompiledRuntimeModel> {
        self.refresh_designer_classes(force_validation);

        // With every requested class clean, the stored errors and the cached
        // metadata are both still valid and compilation is skipped entirely.
        let mut requested = vec![ErrorClass::RuntimeCsdl];
        if validate_mapping {
            requested.push(ErrorClass::RuntimeSsdl);
            requested.push(ErrorClass::RuntimeMsl);
        }
        if run_view_gen {
            requested.push(ErrorClass::RuntimeViewGen);
        }
        if !force_validation
            && requested.iter().all(|class| !self.artifact.errors().is_dirty(*class))
        {
            if requested.iter().any(|class| self.blocking(*class)) {
                return None;
            }
            if let Some(model) = self.artifact.runtime_model.clone() {
                debug!("every requested class clean; reusing cached runtime metadata");
                return Some(model);
            }
        }

        let mut model = CompiledRuntimeModel::default();

        // CSDL stage
        if !self.stage_present(ModelSpace::Conceptual) {
            self.report_model_missing(
                force_validation,
                ErrorClass::RuntimeCsdl,
                codes::CSDL_MODEL_MISSING,
                ModelSpace::Conceptual,
                "conceptual",
            );
            return None;
        }
        let (parts, raws) = compile_schema(self.artifact, ModelSpace::Conceptual);
        self.refresh_class(force_validation, ErrorClass::RuntimeCsdl, raws);
        extend_model(&mut model, parts);
        if self.blocking(ErrorClass::RuntimeCsdl) {
            return None;
        }

        if !validate_mapping {
            debug!("validation stopped after CSDL (mapping validation not requested)");
            return Some(model);
        }

        // SSDL stage
        if !self.stage_present(ModelSpace::Storage) {
            self.report_model_missing(
                force_validation,
                ErrorClass::RuntimeSsdl,
                codes::SSDL_MODEL_MISSING,
                ModelSpace::Storage,
                "storage",
            );
            return None;
        }
        let (parts, raws) = compile_schema(self.artifact, ModelSpace::Storage);
        self.refresh_class(force_validation, ErrorClass::RuntimeSsdl, raws);
        extend_model(&mut model, parts);
        if self.blocking(ErrorClass::RuntimeSsdl) {
            return None;
        }

        // MSL stage
        if !self.stage_present(ModelSpace::Mapping) {
            self.report_model_missing(
                force_validation,
                ErrorClass::RuntimeMsl,
                codes::MSL_MODEL_MISSING,
                ModelSpace::Mapping,
                "mapping",
            );
            return None;
        }
        let (set_mappings, raws) = compile_mapping(self.artifact, self.artifact.version());
        self.refresh_class(force_validation, ErrorClass::RuntimeMsl, raws);
        model.set_mappings = set_mappings;
        if self.blocking(ErrorClass::RuntimeMsl) {
            return None;
        }

        // View generation
        if run_view_gen {
            let raws = generate_views(self.artifact, &model.set_mappings, &model.entity_types);
            self.refresh_class(force_validation, ErrorClass::RuntimeViewGen, raws);
            if self.blocking(ErrorClass::RuntimeViewGen) {
                return None;
            }
        }

        // Only a full pipeline run yields metadata worth caching.
        if validate_mapping && run_view_gen {
            self.artifact.runtime_model = Some(model.clone());
        }
        Some(model)
    }

    /// Map raw compiler errors to designer errors: look up the originating
    /// element by line/column and apply the fixed rewrite set. All other
    /// codes pass through verbatim.
    pub fn process_errors(&self, raws: Vec<RawError>, class: ErrorClass) -> Vec<ErrorInfo> {
        raws.into_iter()
            .map(|raw| {
                let mut severity = raw.severity;
                let mut message = raw.message;
                let mut source = raw.position.and_then(|position| {
                    self.artifact.tree().find_at_position(raw.space, position)
                });

                match raw.code {
                    // While the storage model has no entity container yet the
                    // user is still authoring it; a hard error here would be
                    // spurious. Preserved as-is: the trigger condition is the
                    // container's absence, nothing subtler.
                    codes::MSL_INSTANCE_NOT_SPECIFIED
                        if self.artifact.storage_entity_container().is_none() =>
                    {
                        severity = Severity::Warning;
                    }
                    codes::MSL_ASSOCIATION_SET_NOT_FULLY_MAPPED => {
                        severity = Severity::Warning;
                        message = format!(
                            "{message}. If this is a foreign-key association its mapping is \
                             intentionally omitted and this warning can be ignored"
                        );
                    }
                    codes::CSDL_UNQUALIFIED_COMPLEX_TYPE => {
                        source = source.map(|element| self.owning_property(element));
                        message = format!(
                            "The property's complex type must be referenced by its \
                             namespace-qualified name. {message}"
                        );
                    }
                    _ => {}
                }

                ErrorInfo::new(severity, message, source, raw.code, class)
            })
            .collect()
    }

    fn stage_present(&self, space: ModelSpace) -> bool {
        !self.artifact.tree().roots_in_space(space).is_empty()
    }

    fn blocking(&self, class: ErrorClass) -> bool {
        self.artifact.errors().class_has_blocking_errors(class)
    }

    fn refresh_class(&mut self, force: bool, class: ErrorClass, raws: Vec<RawError>) {
        if !force && !self.artifact.errors().is_dirty(class) {
            return;
        }
        let infos = self.process_errors(raws, class);
        self.artifact.errors.replace_class(class, infos);
        self.artifact.errors.clear_dirty(class);
        self.artifact.publish(ArtifactEvent::ErrorsChanged { class });
    }

    fn report_model_missing(
        &mut self,
        force: bool,
        class: ErrorClass,
        code: u32,
        space: ModelSpace,
        which: &str,
    ) {
        let raw = RawError {
            code,
            severity: Severity::Error,
            message: format!("The {which} model is missing from this document set"),
            space,
            position: None,
        };
        self.refresh_class(force, class, vec![raw]);
    }

    /// Designer structural checks, reported per space under the designer
    /// classes: every symbol declared more than once in the same space.
    fn refresh_designer_classes(&mut self, force: bool) {
        for (class, space) in [
            (ErrorClass::DesignerCsdl, ModelSpace::Conceptual),
            (ErrorClass::DesignerSsdl, ModelSpace::Storage),
            (ErrorClass::DesignerMsl, ModelSpace::Mapping),
        ] {
            if !force && !self.artifact.errors().is_dirty(class) {
                continue;
            }
            let mut infos = Vec::new();
            for (symbol, candidates) in self.artifact.symbols().duplicates() {
                let in_space: Vec<ElementId> = candidates
                    .iter()
                    .copied()
                    .filter(|id| {
                        self.artifact
                            .tree()
                            .get(*id)
                            .is_some_and(|el| el.space == space)
                    })
                    .collect();
                for duplicate in in_space.iter().skip(1) {
                    infos.push(ErrorInfo::new(
                        Severity::Error,
                        format!("The symbol '{symbol}' is already defined"),
                        Some(*duplicate),
                        codes::DESIGNER_DUPLICATE_SYMBOL,
                        class,
                    ));
                }
            }
            self.artifact.errors.replace_class(class, infos);
            self.artifact.errors.clear_dirty(class);
            self.artifact.publish(ArtifactEvent::ErrorsChanged { class });
        }
    }

    /// Unqualified-complex-type errors point at the owning property rather
    /// than the raw type reference.
    fn owning_property(&self, element: ElementId) -> ElementId {
        let tree = self.artifact.tree();
        if tree.get(element).is_some_and(|el| el.kind == ElementKind::Property) {
            return element;
        }
        tree.nearest_ancestor(element, ElementKind::Property)
            .unwrap_or(element)
    }
}

/// Whether this error is actionable by opening the document at the
/// offending element, as opposed to a secondary/derived error suppressed
/// from that navigation.
pub fn is_open_in_editor_error(error: &ErrorInfo) -> bool {
    if codes::is_unrecoverable(error.code) {
        return true;
    }
    if error.class.is_designer() {
        return false;
    }
    error.source.is_some() && !codes::SUPPRESSED_IN_EDITOR.contains(&error.code)
}

fn extend_model(model: &mut CompiledRuntimeModel, parts: SchemaParts) {
    model.entity_types.extend(parts.entity_types);
    model.associations.extend(parts.associations);
    model.containers.extend(parts.containers);
}
