//! Shared JSON fixtures for tests and benches. Paths are indexed by `fixtures/manifest.json`
//! at the workspace root.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    skeletons: HashMap<String, String>,
    #[serde(rename = "animation-sets")]
    animation_sets: HashMap<String, AnimationSetEntry>,
}

/// An animation set and the skeleton fixture it was authored against.
#[derive(Debug, Deserialize)]
struct AnimationSetEntry {
    path: String,
    skeleton: String,
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

pub mod skeletons {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.skeletons.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        let rel = lookup(&MANIFEST.skeletons, "skeleton", name)?;
        read_to_string(rel)
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let rel = lookup(&MANIFEST.skeletons, "skeleton", name)?;
        super::load_json(rel)
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let rel = lookup(&MANIFEST.skeletons, "skeleton", name)?;
        Ok(resolve_path(rel))
    }
}

pub mod animation_sets {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.animation_sets.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        let entry = lookup(&MANIFEST.animation_sets, "animation set", name)?;
        read_to_string(&entry.path)
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let entry = lookup(&MANIFEST.animation_sets, "animation set", name)?;
        super::load_json(&entry.path)
    }

    /// Name of the skeleton fixture the set targets.
    pub fn skeleton_name(name: &str) -> Result<&'static str> {
        let entry = lookup(&MANIFEST.animation_sets, "animation set", name)?;
        Ok(entry.skeleton.as_str())
    }

    /// Skeleton JSON and animation set JSON, in that order.
    pub fn with_skeleton_json(name: &str) -> Result<(String, String)> {
        let skeleton = super::skeletons::json(skeleton_name(name)?)?;
        Ok((skeleton, json(name)?))
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let entry = lookup(&MANIFEST.animation_sets, "animation set", name)?;
        Ok(resolve_path(&entry.path))
    }
}
