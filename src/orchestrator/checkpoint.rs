//! Checkpoint/resume (§4.O): a pair of sidecar files that let a multi-category
//! run survive interruption, grounded on the original `pipeline/checkpoint.py`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::Lead;

#[derive(Debug, Serialize, Deserialize, Default)]
struct LeadsFile {
    leads: Vec<Lead>,
}

/// Accumulated state of a multi-category run, persisted every `checkpoint_every`
/// categories so the run can resume after interruption (§4.O, §8 scenario 4).
#[derive(Debug, Clone, Default)]
pub struct Checkpoint {
    pub leads: Vec<Lead>,
    pub processed_categories: Vec<String>,
}

fn leads_path(dir: &Path, city_slug: &str) -> PathBuf {
    dir.join(format!(".checkpoint_leads_{city_slug}.json"))
}

fn categories_path(dir: &Path, city_slug: &str) -> PathBuf {
    dir.join(format!(".checkpoint_branchen_{city_slug}.json"))
}

impl Checkpoint {
    /// Loads both checkpoint files if, and only if, both exist; a lone
    /// surviving file is treated as no checkpoint (§4.O: "if both files exist").
    #[must_use]
    pub fn load(dir: &Path, city_slug: &str) -> Option<Self> {
        let leads_file = leads_path(dir, city_slug);
        let categories_file = categories_path(dir, city_slug);
        if !leads_file.exists() || !categories_file.exists() {
            return None;
        }
        let leads_json = std::fs::read_to_string(&leads_file).ok()?;
        let categories_json = std::fs::read_to_string(&categories_file).ok()?;
        let leads_doc: LeadsFile = serde_json::from_str(&leads_json).ok()?;
        let processed_categories: Vec<String> = serde_json::from_str(&categories_json).ok()?;
        Some(Self { leads: leads_doc.leads, processed_categories })
    }

    /// Flushes the checkpoint to disk, overwriting any prior checkpoint.
    pub fn save(&self, dir: &Path, city_slug: &str) -> std::io::Result<()> {
        let leads_doc = LeadsFile { leads: self.leads.clone() };
        std::fs::write(leads_path(dir, city_slug), serde_json::to_string(&leads_doc)?)?;
        std::fs::write(categories_path(dir, city_slug), serde_json::to_string(&self.processed_categories)?)?;
        Ok(())
    }

    /// Deletes both checkpoint files; called on successful full completion (§4.O).
    pub fn delete(dir: &Path, city_slug: &str) {
        let _ = std::fs::remove_file(leads_path(dir, city_slug));
        let _ = std::fs::remove_file(categories_path(dir, city_slug));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Address, Source};

    #[test]
    fn round_trips_through_save_and_load() {
        let dir = tempfile_dir();
        let mut checkpoint = Checkpoint::default();
        checkpoint.leads.push(Lead::new(
            "Test GmbH".into(),
            "Friseur".into(),
            Address::empty("Essen"),
            Source::Directory,
            "https://example.test/1".into(),
        ));
        checkpoint.processed_categories = vec!["A".into(), "B".into(), "C".into()];
        checkpoint.save(&dir, "essen").unwrap();

        let loaded = Checkpoint::load(&dir, "essen").expect("checkpoint exists");
        assert_eq!(loaded.leads.len(), 1);
        assert_eq!(loaded.processed_categories, vec!["A", "B", "C"]);

        Checkpoint::delete(&dir, "essen");
        assert!(Checkpoint::load(&dir, "essen").is_none());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn lone_surviving_file_is_not_a_checkpoint() {
        let dir = tempfile_dir();
        std::fs::write(leads_path(&dir, "hamm"), "{\"leads\":[]}").unwrap();
        assert!(Checkpoint::load(&dir, "hamm").is_none());
        std::fs::remove_dir_all(&dir).ok();
    }

    fn tempfile_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gelbe_leads_checkpoint_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
