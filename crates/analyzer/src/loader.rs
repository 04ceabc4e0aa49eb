use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use etude_audio::{ClassMap, SoundClassifier, YamnetClassifier};
use etude_domain::KeywordTable;

/// Load the keyword rules from `path`, or the built-in table when absent.
pub fn load_keywords(path: Option<&Path>) -> Result<KeywordTable> {
    match path {
        Some(path) => {
            let table = KeywordTable::from_path(path)
                .with_context(|| format!("load keyword rules {:?}", path))?;
            info!(path = ?path, rules = table.rules().len(), "loaded keyword rules");
            Ok(table)
        }
        None => Ok(KeywordTable::default()),
    }
}

pub fn load_yamnet(model: &Path, class_map: &Path) -> Result<Arc<dyn SoundClassifier>> {
    let class_map = ClassMap::from_path(class_map)?;
    let classifier = YamnetClassifier::load(model, &class_map)?;
    Ok(Arc::new(classifier))
}
