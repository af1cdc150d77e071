mod loader;

pub use loader::{LoadError, load_document};

use crate::artifact::Artifact;
use crate::model::ModelSpace;
use crate::resolve::DrainStats;

impl Artifact {
    /// Load the provided documents in one transaction and resolve to
    /// fixpoint. Documents may arrive in any order and may forward-reference
    /// each other freely; a missing document is not an error here (the
    /// validator reports it as a missing model).
    pub fn load_documents(
        &mut self,
        conceptual: Option<&str>,
        storage: Option<&str>,
        mapping: Option<&str>,
    ) -> Result<DrainStats, LoadError> {
        let mut tx = self.begin();
        if let Some(text) = conceptual {
            load_document(&mut tx, ModelSpace::Conceptual, text)?;
        }
        if let Some(text) = storage {
            load_document(&mut tx, ModelSpace::Storage, text)?;
        }
        if let Some(text) = mapping {
            load_document(&mut tx, ModelSpace::Mapping, text)?;
        }
        Ok(tx.commit())
    }
}
