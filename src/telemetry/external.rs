use crate::errors::TelemetryResult;
use crate::gpmf::RawGpsPoint;
use crate::pipeline::cancel::CancellationToken;
use crate::pipeline::config::ExtractorConfig;
use crate::telemetry::structured::parse_sample;
use log::{debug, info, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::NamedTempFile;

/// Common install locations probed after the environment overrides
const FIXED_TOOL_DIRS: &[&str] = &[
    "/usr/bin",
    "/usr/local/bin",
    "/opt/homebrew/bin",
    "/opt/local/bin",
    "C:\\ffmpeg\\bin",
];

/// The two optional helper executables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// Stream prober (ffprobe)
    Probe,
    /// Stream extractor (ffmpeg)
    Extract,
}

impl Tool {
    pub fn binary_name(&self) -> &'static str {
        match (self, cfg!(windows)) {
            (Tool::Probe, false) => "ffprobe",
            (Tool::Probe, true) => "ffprobe.exe",
            (Tool::Extract, false) => "ffmpeg",
            (Tool::Extract, true) => "ffmpeg.exe",
        }
    }

    /// Override variables, highest priority first
    pub fn env_vars(&self) -> &'static [&'static str] {
        match self {
            Tool::Probe => &["CAMTELEMETRY_FFPROBE", "FFPROBE_PATH"],
            Tool::Extract => &["CAMTELEMETRY_FFMPEG", "FFMPEG_PATH"],
        }
    }
}

/// Where a candidate executable path came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    EnvOverride,
    FixedDir,
    WorkingDir,
    ResourceDir,
    SearchPath,
}

/// Ordered executable discovery. The first candidate that is an executable
/// file wins.
#[derive(Debug, Clone, Default)]
pub struct ToolLocator {
    env_overrides: HashMap<Tool, Vec<PathBuf>>,
    fixed_dirs: Vec<PathBuf>,
    working_dir: Option<PathBuf>,
    resource_dir: Option<PathBuf>,
    search_path: Vec<PathBuf>,
}

impl ToolLocator {
    /// Capture the process environment and the configured resource directory
    pub fn from_config(config: &ExtractorConfig) -> Self {
        let env_overrides = [Tool::Probe, Tool::Extract]
            .into_iter()
            .map(|tool| {
                let paths = tool
                    .env_vars()
                    .iter()
                    .filter_map(|name| env::var_os(name))
                    .filter(|v| !v.is_empty())
                    .map(PathBuf::from)
                    .collect();
                (tool, paths)
            })
            .collect();

        ToolLocator {
            env_overrides,
            fixed_dirs: FIXED_TOOL_DIRS.iter().map(PathBuf::from).collect(),
            working_dir: env::current_dir().ok(),
            resource_dir: config.resolved_resource_dir(),
            search_path: env::var_os("PATH")
                .map(|p| env::split_paths(&p).collect())
                .unwrap_or_default(),
        }
    }

    /// Every place `tool` may live, in priority order
    pub fn candidates(&self, tool: Tool) -> Vec<(CandidateSource, PathBuf)> {
        let name = tool.binary_name();
        let mut out: Vec<(CandidateSource, PathBuf)> = self
            .env_overrides
            .get(&tool)
            .into_iter()
            .flatten()
            .map(|p| (CandidateSource::EnvOverride, p.clone()))
            .collect();
        out.extend(
            self.fixed_dirs
                .iter()
                .map(|d| (CandidateSource::FixedDir, d.join(name))),
        );
        out.extend(
            self.working_dir
                .iter()
                .map(|d| (CandidateSource::WorkingDir, d.join(name))),
        );
        out.extend(
            self.resource_dir
                .iter()
                .map(|d| (CandidateSource::ResourceDir, d.join(name))),
        );
        out.extend(
            self.search_path
                .iter()
                .map(|d| (CandidateSource::SearchPath, d.join(name))),
        );
        out
    }

    pub fn locate(&self, tool: Tool) -> Option<PathBuf> {
        let (source, path) = self
            .candidates(tool)
            .into_iter()
            .find(|(_, path)| is_executable(path))?;
        debug!("Using {:?} at {} ({:?})", tool, path.display(), source);
        Some(path)
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}

/// The part of the prober's JSON report this module reads
#[derive(Debug, Default, Deserialize)]
pub struct ProbeReport {
    #[serde(default)]
    pub streams: Vec<ProbeStream>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeStream {
    pub index: u32,
    #[serde(default)]
    pub codec_type: Option<String>,
    #[serde(default)]
    pub codec_name: Option<String>,
    #[serde(default)]
    pub codec_tag_string: Option<String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

impl ProbeStream {
    fn handler_name(&self) -> Option<&str> {
        self.tags.get("handler_name").map(String::as_str)
    }
}

/// Likelihood that a stream carries the camera metadata; 0 means never
pub fn score_stream(stream: &ProbeStream) -> u32 {
    let mut score = 0;
    if stream.codec_tag_string.as_deref() == Some("gpmd") {
        score += 100;
    }
    if stream.handler_name().is_some_and(|h| h.contains("GoPro MET")) {
        score += 50;
    }
    if stream.codec_name.as_deref() == Some("bin_data") {
        score += 20;
    }
    if stream.codec_type.as_deref() == Some("data") {
        score += 5;
    }
    score
}

/// Stream indices worth extracting, best first
pub fn rank_streams(report: &ProbeReport, limit: usize) -> Vec<u32> {
    let mut scored: Vec<(u32, u32)> = report
        .streams
        .iter()
        .map(|s| (score_stream(s), s.index))
        .filter(|(score, _)| *score > 0)
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    scored.into_iter().take(limit).map(|(_, index)| index).collect()
}

pub fn parse_probe_output(json: &[u8]) -> serde_json::Result<ProbeReport> {
    serde_json::from_slice(json)
}

/// Codec and format arguments tried in turn for one stream
const EXTRACT_VARIANTS: &[&[&str]] = &[
    &["-codec", "copy", "-f", "data"],
    &["-c", "copy", "-f", "rawvideo"],
    &["-f", "data"],
];

fn probe_streams(probe: &Path, input: &Path) -> Option<ProbeReport> {
    let output = Command::new(probe)
        .args(["-v", "quiet", "-print_format", "json", "-show_streams"])
        .arg(input)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output();
    let output = match output {
        Ok(o) if o.status.success() => o,
        Ok(o) => {
            warn!("Stream probe exited with {}", o.status);
            return None;
        }
        Err(e) => {
            warn!("Failed to run stream probe: {}", e);
            return None;
        }
    };
    match parse_probe_output(&output.stdout) {
        Ok(report) => Some(report),
        Err(e) => {
            warn!("Unreadable stream probe output: {}", e);
            None
        }
    }
}

fn extract_stream(extractor: &Path, input: &Path, index: u32, variant: &[&str]) -> Option<Vec<u8>> {
    // Removed when dropped, on every return path
    let target = match NamedTempFile::new() {
        Ok(t) => t,
        Err(e) => {
            warn!("Failed to create temporary file: {}", e);
            return None;
        }
    };
    let status = Command::new(extractor)
        .args(["-y", "-v", "quiet", "-i"])
        .arg(input)
        .arg("-map")
        .arg(format!("0:{}", index))
        .args(variant)
        .arg(target.path())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match status {
        Ok(s) if s.success() => {}
        Ok(s) => {
            debug!("Extraction of stream {} with {:?} exited with {}", index, variant, s);
            return None;
        }
        Err(e) => {
            warn!("Failed to run stream extractor: {}", e);
            return None;
        }
    }
    match fs::read(target.path()) {
        Ok(bytes) if !bytes.is_empty() => Some(bytes),
        Ok(_) => None,
        Err(e) => {
            warn!("Failed to read extracted stream {}: {}", index, e);
            None
        }
    }
}

/// Recover points through the external prober and extractor.
///
/// Missing executables or failing runs yield an empty result. Cancellation
/// is checked before every subprocess.
pub fn extract_external(
    input: &Path,
    config: &ExtractorConfig,
    cancel: &CancellationToken,
) -> TelemetryResult<Vec<RawGpsPoint>> {
    let locator = ToolLocator::from_config(config);
    extract_with_tools(input, &locator, config.max_external_streams, cancel)
}

fn extract_with_tools(
    input: &Path,
    locator: &ToolLocator,
    max_streams: usize,
    cancel: &CancellationToken,
) -> TelemetryResult<Vec<RawGpsPoint>> {
    let (Some(probe), Some(extractor)) = (locator.locate(Tool::Probe), locator.locate(Tool::Extract))
    else {
        debug!("External tools not available, skipping");
        return Ok(Vec::new());
    };

    cancel.check()?;
    let Some(report) = probe_streams(&probe, input) else {
        return Ok(Vec::new());
    };
    let ranked = rank_streams(&report, max_streams);
    info!(
        "External probe listed {} streams, {} candidates",
        report.streams.len(),
        ranked.len()
    );

    for index in ranked {
        for variant in EXTRACT_VARIANTS {
            cancel.check()?;
            let Some(bytes) = extract_stream(&extractor, input, index, variant) else {
                continue;
            };
            let parsed = parse_sample(&bytes);
            if !parsed.points.is_empty() {
                info!(
                    "Stream {} yielded {} points via external extraction",
                    index,
                    parsed.points.len()
                );
                return Ok(parsed.points);
            }
        }
    }
    Ok(Vec::new())
}
