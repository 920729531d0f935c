use serde::Deserialize;

/// Main configuration structure for Roster-Harvest
///
/// Every section has built-in defaults, so an empty TOML file (or no file at
/// all) yields the standard run parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub harvest: HarvestConfig,
    pub target: TargetConfig,
    pub output: OutputConfig,
    #[serde(rename = "facility")]
    pub facilities: Vec<FacilityEntry>,
}

/// Identifier space and pipeline sizing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Two-digit intake year codes, in enumeration order
    pub years: Vec<String>,

    /// Highest sequence number per (year, facility, department)
    #[serde(rename = "max-sequence")]
    pub max_sequence: u32,

    /// Number of sessions in the pool
    pub workers: usize,

    /// Number of identifiers dispatched and checkpointed together
    #[serde(rename = "batch-size")]
    pub batch_size: usize,

    /// How long to wait for the record table to render (milliseconds)
    #[serde(rename = "marker-timeout-ms")]
    pub marker_timeout_ms: u64,

    /// Interval between content checks while waiting (milliseconds)
    #[serde(rename = "poll-interval-ms")]
    pub poll_interval_ms: u64,
}

/// Remote record page
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Page URL with an `{id}` placeholder
    #[serde(rename = "url-template")]
    pub url_template: String,

    /// Overall timeout for plain HTTP requests such as image downloads (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// What renders the record pages
    pub engine: SessionEngine,
}

/// Page rendering engine used by the session pool
///
/// The record pages are rendered client-side, so builds with the `chrome`
/// feature default to headless Chromium. `http` only sees the served HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionEngine {
    Http,
    Chrome,
}

impl Default for SessionEngine {
    fn default() -> Self {
        if cfg!(feature = "chrome") {
            Self::Chrome
        } else {
            Self::Http
        }
    }
}

/// Output locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving checkpoint and final files
    pub directory: String,

    /// Directory for downloaded profile images, relative to `directory`
    #[serde(rename = "image-directory")]
    pub image_directory: String,
}

/// A facility with its departments, in declaration order
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FacilityEntry {
    pub code: String,
    pub name: String,
    pub departments: Vec<DepartmentEntry>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DepartmentEntry {
    pub code: String,
    pub label: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            harvest: HarvestConfig::default(),
            target: TargetConfig::default(),
            output: OutputConfig::default(),
            facilities: default_facilities(),
        }
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            years: vec!["22".to_string()],
            max_sequence: 35,
            workers: 5,
            batch_size: 50,
            marker_timeout_ms: 5_000,
            poll_interval_ms: 250,
        }
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url_template: "https://my.paragoniu.edu.kh/qr?student_id={id}".to_string(),
            request_timeout_secs: 30,
            engine: SessionEngine::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
            image_directory: "images".to_string(),
        }
    }
}

impl FacilityEntry {
    fn new(code: &str, name: &str, departments: &[(&str, &str)]) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            departments: departments
                .iter()
                .map(|(code, label)| DepartmentEntry {
                    code: code.to_string(),
                    label: label.to_string(),
                })
                .collect(),
        }
    }
}

fn default_facilities() -> Vec<FacilityEntry> {
    vec![
        FacilityEntry::new("01", "Engineering", &[("01", "CE"), ("03", "ARC"), ("05", "IE")]),
        FacilityEntry::new(
            "02",
            "Information Technology",
            &[("01", "CS"), ("02", "DAD"), ("03", "MIS")],
        ),
        FacilityEntry::new(
            "04",
            "Economics and Administrative Sciences",
            &[("01", "BAF"), ("02", "BUS"), ("03", "IR"), ("04", "ITL")],
        ),
    ]
}
