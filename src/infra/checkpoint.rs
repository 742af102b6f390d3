// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder.
//
// What gets saved:
//   1. Model weights (.mpk.gz file) — one per epoch
//   2. latest_epoch.json            — which epoch was last saved
//   3. train_config.json            — architecture + run settings
//   4. positional.json              — the fixed positional table,
//                                     only for the positional variant
//
// Inference rebuilds the model from train_config.json before
// loading weights, and must encode inputs with the exact table
// the model was trained on.
//
// File naming convention:
//   checkpoints/
//     model_epoch_1.mpk.gz
//     model_epoch_2.mpk.gz
//     latest_epoch.json
//     train_config.json
//     positional.json
//     metrics.csv              ← written by MetricsLogger
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{ensure, Context, Result};
use std::{fs, path::{Path, PathBuf}};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::{de::DeserializeOwned, Serialize};

use crate::application::train_use_case::TrainConfig;
use crate::data::positional::PositionalTable;
use crate::ml::model::SortTransformer;

const LATEST_EPOCH_FILE: &str = "latest_epoch.json";
const CONFIG_FILE:       &str = "train_config.json";
const POSITIONAL_FILE:   &str = "positional.json";

/// Manages saving and loading of model checkpoints.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager.
    /// The directory is only created by the first save.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    /// Write {dir}/model_epoch_{epoch}.mpk.gz and move the latest pointer.
    pub fn save_model<B: Backend>(
        &self,
        model: &SortTransformer<B>,
        epoch: usize,
    ) -> Result<()> {
        // Without extension — the recorder adds it
        let path = self.dir.join(format!("model_epoch_{epoch}"));
        self.ensure_dir()?;

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", path.display())
            })?;

        self.write_json(LATEST_EPOCH_FILE, &epoch)?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load the latest weights into `model`, which must already have
    /// the architecture recorded in train_config.json.
    pub fn load_model<B: Backend>(
        &self,
        model:  SortTransformer<B>,
        device: &B::Device,
    ) -> Result<SortTransformer<B>> {
        let epoch = self.latest_epoch()?;
        let path  = self.dir.join(format!("model_epoch_{epoch}"));

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;

        Ok(model.load_record(record))
    }

    /// Must be called before training starts.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.write_json(CONFIG_FILE, cfg)?;
        tracing::debug!("Saved training config to '{}'", self.dir.join(CONFIG_FILE).display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        self.read_json(CONFIG_FILE)
            .context("Make sure you have run 'train' before 'sort' or 'attention'.")
    }

    pub fn save_positional(&self, table: &PositionalTable) -> Result<()> {
        self.write_json(POSITIONAL_FILE, table)
    }

    /// Load the positional table and check it covers `max_len` positions.
    pub fn load_positional(&self, max_len: usize) -> Result<PositionalTable> {
        let table: PositionalTable = self.read_json(POSITIONAL_FILE)?;
        ensure!(
            table.is_well_formed() && table.max_len() >= max_len,
            "'{}' does not match the saved configuration (max_len {})",
            self.dir.join(POSITIONAL_FILE).display(), max_len,
        );
        Ok(table)
    }

    /// Returns an error if training hasn't been run yet.
    fn latest_epoch(&self) -> Result<usize> {
        self.read_json(LATEST_EPOCH_FILE)
            .context("Cannot find the latest checkpoint. Have you run 'train' first?")
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", self.dir.display()))
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        self.ensure_dir()?;
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("'{}' is not valid", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::batcher::SortBatcher;
    use crate::domain::sequence::{DigitSequence, SortSample};
    use crate::ml::model::SortTransformerConfig;
    use burn::backend::NdArray;
    use rand::{rngs::StdRng, SeedableRng};

    type TestBackend = NdArray;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("attention-sort-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_config_roundtrip() {
        let dir  = temp_dir("ckpt-config");
        let ckpt = CheckpointManager::new(&dir);
        let cfg  = TrainConfig { hidden: 32, positional: true, ..TrainConfig::default() };
        ckpt.save_config(&cfg).unwrap();

        let back = ckpt.load_config().unwrap();
        assert_eq!(back.hidden, 32);
        assert!(back.positional);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_checkpoint_is_an_error() {
        let dir  = temp_dir("ckpt-missing");
        let ckpt = CheckpointManager::new(&dir);
        assert!(ckpt.load_config().is_err());
        assert!(ckpt.latest_epoch().is_err());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_loading_does_not_create_the_directory() {
        let dir  = temp_dir("ckpt-readonly");
        let ckpt = CheckpointManager::new(&dir);
        assert!(ckpt.load_config().is_err());
        assert!(ckpt.load_positional(4).is_err());
        assert!(!dir.exists());

        ckpt.save_config(&TrainConfig::default()).unwrap();
        assert!(dir.join(CONFIG_FILE).exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_model_restores_saved_weights() {
        let dir    = temp_dir("ckpt-weights");
        let ckpt   = CheckpointManager::new(&dir);
        let device = Default::default();
        let config = SortTransformerConfig::new(10, 16, 2, 1, 32, 0.0);

        let saved: SortTransformer<TestBackend> = config.init(&device);
        ckpt.save_model(&saved, 1).unwrap();

        let inputs = SortBatcher::<TestBackend>::new(device.clone(), None)
            .batch(&[SortSample::from_input(DigitSequence::parse("4 0 7 2").unwrap())])
            .inputs;
        let outputs = |model: &SortTransformer<TestBackend>| -> Vec<f32> {
            model.forward(inputs.clone()).into_data().iter::<f32>().collect()
        };

        // Independently initialised models disagree before loading
        let fresh: SortTransformer<TestBackend> = config.init(&device);
        let expected = outputs(&saved);
        let before   = outputs(&fresh);
        assert!(expected.iter().zip(&before).any(|(a, b)| (a - b).abs() > 1e-3));

        // Two loads into different inits give identical weights
        let first  = ckpt.load_model(fresh, &device).unwrap();
        let second = ckpt.load_model(config.init(&device), &device).unwrap();
        let loaded = outputs(&first);
        assert_eq!(loaded, outputs(&second));

        // The recorder stores half precision, so compare with a tolerance
        for (a, b) in expected.iter().zip(&loaded) {
            assert!((a - b).abs() < 5e-2, "{a} vs {b}");
        }
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_positional_table_must_cover_max_len() {
        let dir   = temp_dir("ckpt-positional");
        let ckpt  = CheckpointManager::new(&dir);
        let mut rng = StdRng::seed_from_u64(1);
        ckpt.save_positional(&PositionalTable::random(6, &mut rng)).unwrap();

        assert_eq!(ckpt.load_positional(6).unwrap().max_len(), 6);
        assert!(ckpt.load_positional(7).is_err());
        let _ = fs::remove_dir_all(&dir);
    }
}
