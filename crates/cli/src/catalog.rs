//! Item catalogs loaded from JSON.

use anyhow::{Context, Result};
use rand::Rng;
use rand::seq::SliceRandom;
use std::path::Path;
use tally_core::ItemIdentity;

/// Items shown when no catalog file is given.
const BUILTIN_ITEMS: &str = r#"[
    {"question": "Why don't scientists trust atoms?", "answer": "Because they make up everything."},
    {"question": "What do you call a fake noodle?", "answer": "An impasta."},
    {"question": "Why did the scarecrow win an award?", "answer": "He was outstanding in his field."},
    {"question": "Why don't skeletons fight each other?", "answer": "They don't have the guts."},
    {"question": "What do you call a bear with no teeth?", "answer": "A gummy bear."}
]"#;

/// An ordered list of items a client can show.
#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<ItemIdentity>,
}

impl Catalog {
    /// Parse a JSON array of `{question, answer}` objects.
    pub fn from_json(json: &str) -> Result<Self> {
        let items: Vec<ItemIdentity> =
            serde_json::from_str(json).context("catalog must be a JSON array of {question, answer}")?;
        if items.is_empty() {
            anyhow::bail!("catalog contains no items");
        }
        Ok(Self { items })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog: {}", path.display()))?;
        Self::from_json(&contents).with_context(|| format!("invalid catalog: {}", path.display()))
    }

    /// Load `path` when given, otherwise the built-in items.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::from_json(BUILTIN_ITEMS),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn get(&self, index: usize) -> Result<&ItemIdentity> {
        self.items.get(index).ok_or_else(|| {
            anyhow::anyhow!(
                "item index {index} out of range (catalog has {} items)",
                self.items.len()
            )
        })
    }

    /// Pick a random item, avoiding `previous` when there is a choice.
    pub fn pick<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        previous: Option<usize>,
    ) -> (usize, &ItemIdentity) {
        let candidates: Vec<usize> = (0..self.items.len())
            .filter(|i| self.items.len() == 1 || Some(*i) != previous)
            .collect();
        // Non-empty: from_json rejects empty catalogs
        let index = candidates.choose(rng).copied().unwrap_or(0);
        (index, &self.items[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn builtin_catalog_loads() {
        let catalog = Catalog::load_or_builtin(None).unwrap();
        assert_eq!(catalog.len(), 5);
        assert!(!catalog.get(0).unwrap().answer.is_empty());
    }

    #[test]
    fn load_from_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("jokes.json");
        std::fs::write(
            &path,
            r#"[{"question": "Q1", "answer": "A1"}, {"question": "Q2", "answer": "A2"}]"#,
        )
        .unwrap();

        let catalog = Catalog::load_or_builtin(Some(&path)).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(1).unwrap(), &ItemIdentity::new("Q2", "A2"));
        assert!(catalog.get(2).is_err());
    }

    #[test]
    fn rejects_empty_and_malformed() {
        assert!(Catalog::from_json("[]").is_err());
        assert!(Catalog::from_json(r#"[{"question": "only"}]"#).is_err());
        assert!(Catalog::from_json("{}").is_err());
    }

    #[test]
    fn pick_avoids_previous_item() {
        let catalog = Catalog::from_json(
            r#"[{"question": "a", "answer": "1"}, {"question": "b", "answer": "2"}]"#,
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let (index, _) = catalog.pick(&mut rng, Some(0));
            assert_eq!(index, 1);
        }
    }

    #[test]
    fn pick_single_item_repeats() {
        let catalog = Catalog::from_json(r#"[{"question": "a", "answer": "1"}]"#).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(catalog.pick(&mut rng, Some(0)).0, 0);
    }
}
