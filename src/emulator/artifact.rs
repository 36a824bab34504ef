//! Emulator artifact format.
//!
//! An emulator is a pair of JSON files sharing a base path:
//!
//! - `<base>.json`: metadata: scaling statistics, parameter ranges, and the
//!   parameters of the custom pieces (inverse PCA, WMSE weights)
//! - `<base>.network.json`: the trained network: layer kinds, kernels, biases,
//!   activations, plus a `format_version`
//!
//! The inverse-PCA transform is *not* embedded in the network file; a head
//! ends with `{"kind": "inverse_pca"}` and is completed from the metadata.
//!
//! Scaling vectors are accepted either flat (`[..]`) or as a single nested
//! row (`[[..]]`).

use std::ffi::OsString;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::de::{self, DeserializeOwned, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{AppError, AppResult};
use crate::nn::{Activation, Dense, InversePca, Layer, Network};

/// Current network file format.
pub const NETWORK_FORMAT_VERSION: u32 = 1;

pub const METADATA_SUFFIX: &str = ".json";
pub const NETWORK_SUFFIX: &str = ".network.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmulatorMetadata {
    pub custom_objects: CustomObjects,
    pub data_scaling: DataScaling,
    #[serde(deserialize_with = "ordered_ranges", serialize_with = "ranges_as_map")]
    pub parameter_ranges: Vec<ParameterRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomObjects {
    pub inverse_pca: InversePcaParams,
    #[serde(rename = "WMSE")]
    pub wmse: WmseParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InversePcaParams {
    pub pca_comps: Vec<Vec<f64>>,
    #[serde(deserialize_with = "row_vector")]
    pub pca_mean: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WmseParams {
    #[serde(deserialize_with = "row_vector")]
    pub weights: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataScaling {
    #[serde(deserialize_with = "row_vector")]
    pub inp_mean: Vec<f64>,
    #[serde(deserialize_with = "row_vector")]
    pub inp_std: Vec<f64>,
    #[serde(deserialize_with = "row_vector")]
    pub classical_out_mean: Vec<f64>,
    #[serde(deserialize_with = "row_vector")]
    pub classical_out_std: Vec<f64>,
    #[serde(deserialize_with = "row_vector")]
    pub astero_out_mean: Vec<f64>,
    #[serde(deserialize_with = "row_vector")]
    pub astero_out_std: Vec<f64>,
}

/// Declared training range of one input parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange {
    #[serde(skip)]
    pub name: String,
    pub min: f64,
    pub max: f64,
}

impl ParameterRange {
    /// Name without the `log_` marker used for log-scaled training columns.
    pub fn display_name(&self) -> String {
        self.name.replace("log_", "")
    }

    pub fn describe(&self) -> String {
        format!(
            "{} range: [min = {}, max = {}]",
            self.display_name(),
            self.min,
            self.max
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkFile {
    pub format_version: u32,
    pub inputs: usize,
    #[serde(default)]
    pub trunk: Vec<LayerSpec>,
    pub classical: Vec<LayerSpec>,
    pub astero: Vec<LayerSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerSpec {
    Dense {
        /// Kernel rows, one per input feature (`in × out`).
        weights: Vec<Vec<f64>>,
        bias: Vec<f64>,
        #[serde(default)]
        activation: Activation,
    },
    /// Completed from `custom_objects.inverse_pca` in the metadata.
    InversePca,
}

pub fn metadata_path(base: &Path) -> PathBuf {
    with_suffix(base, METADATA_SUFFIX)
}

pub fn network_path(base: &Path) -> PathBuf {
    with_suffix(base, NETWORK_SUFFIX)
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut s: OsString = base.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}

pub fn read_metadata(path: &Path) -> AppResult<EmulatorMetadata> {
    read_json(path, "emulator metadata")
}

pub fn read_network(path: &Path) -> AppResult<NetworkFile> {
    let file: NetworkFile = read_json(path, "emulator network")?;
    if file.format_version != NETWORK_FORMAT_VERSION {
        return Err(AppError::input(format!(
            "Unsupported network format version {} in '{}' (expected {NETWORK_FORMAT_VERSION}).",
            file.format_version,
            path.display()
        )));
    }
    Ok(file)
}

/// Write both artifact files for `base`.
pub fn write_artifacts(base: &Path, metadata: &EmulatorMetadata, network: &NetworkFile) -> AppResult<()> {
    write_json(&metadata_path(base), metadata, "emulator metadata")?;
    write_json(&network_path(base), network, "emulator network")
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> AppResult<T> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open {what} '{}': {e}", path.display())))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::input(format!("Invalid {what} '{}': {e}", path.display())))
}

fn write_json<T: Serialize>(path: &Path, value: &T, what: &str) -> AppResult<()> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create {what} '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, value)
        .map_err(|e| AppError::input(format!("Failed to write {what}: {e}")))
}

/// Assemble the runtime network from its file form plus the metadata's PCA parameters.
pub fn build_network(file: &NetworkFile, metadata: &EmulatorMetadata) -> AppResult<Network> {
    let pca = &metadata.custom_objects.inverse_pca;
    let build = |specs: &[LayerSpec]| -> AppResult<Vec<Layer>> {
        specs
            .iter()
            .map(|spec| match spec {
                LayerSpec::Dense {
                    weights,
                    bias,
                    activation,
                } => Ok(Layer::Dense(Dense::from_rows(weights, bias.clone(), *activation)?)),
                LayerSpec::InversePca => Ok(Layer::InversePca(InversePca::new(
                    &pca.pca_comps,
                    pca.pca_mean.clone(),
                )?)),
            })
            .collect()
    };

    Network::new(
        file.inputs,
        build(&file.trunk)?,
        build(&file.classical)?,
        build(&file.astero)?,
    )
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RowVector {
    Flat(Vec<f64>),
    Nested(Vec<Vec<f64>>),
}

fn row_vector<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match RowVector::deserialize(deserializer)? {
        RowVector::Flat(v) => Ok(v),
        RowVector::Nested(rows) => rows
            .into_iter()
            .next()
            .ok_or_else(|| de::Error::custom("expected at least one row")),
    }
}

/// Keep parameter ranges in document order (input column order).
fn ordered_ranges<'de, D>(deserializer: D) -> Result<Vec<ParameterRange>, D::Error>
where
    D: Deserializer<'de>,
{
    struct RangesVisitor;

    impl<'de> Visitor<'de> for RangesVisitor {
        type Value = Vec<ParameterRange>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of parameter name to {min, max}")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut out = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, mut range)) = map.next_entry::<String, ParameterRange>()? {
                range.name = name;
                out.push(range);
            }
            Ok(out)
        }
    }

    deserializer.deserialize_map(RangesVisitor)
}

fn ranges_as_map<S>(ranges: &[ParameterRange], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    use serde::ser::SerializeMap;

    let mut map = serializer.serialize_map(Some(ranges.len()))?;
    for r in ranges {
        map.serialize_entry(&r.name, r)?;
    }
    map.end()
}
